// Mapcalc
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Runtime errors

use mapcalc_common::ImageError;
use mapcalc_compiler::CompileError;
use thiserror::Error;

/// Errors raised while binding images, evaluating pixels or running jobs
#[derive(Error, Debug, Clone)]
pub enum RuntimeError {
    /// A source read fell outside the image and no outside value is configured
    #[error("Read of '{image}' at ({x}, {y}) is outside the image bounds")]
    OutOfBounds { image: String, x: i64, y: i64 },

    #[error("Unknown image variable: {0}")]
    UnknownImage(String),

    #[error("Image '{0}' has not been bound")]
    ImageNotBound(String),

    #[error("Unknown image-scope variable: {0}")]
    UnknownVariable(String),

    /// Pixels were evaluated before any destination image was bound
    #[error("Processing bounds are not set: bind a destination image first")]
    BoundsNotSet,

    #[error("Image error: {0}")]
    Image(#[from] ImageError),

    #[error("Evaluation cancelled")]
    Cancelled,

    #[error("Compilation failed: {0}")]
    Compile(#[from] CompileError),

    /// A job's evaluation panicked; the message is the panic payload when it was a string
    #[error("Job panicked: {0}")]
    JobPanicked(String),

    #[error("Executor is shut down")]
    ExecutorShutdown,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;
