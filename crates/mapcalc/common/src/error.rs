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

//! Error types for image access

use thiserror::Error;

/// Errors raised by image implementations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImageError {
    #[error("Pixel ({x}, {y}) is outside the image bounds")]
    OutOfBounds { x: i64, y: i64 },

    #[error("Band {band} out of range: image has {bands} band(s)")]
    BandOutOfRange { band: usize, bands: usize },

    #[error("Invalid image geometry: {0}")]
    InvalidGeometry(String),
}

/// Result type for image operations
pub type ImageResult<T> = Result<T, ImageError>;
