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

//! Execution side of mapcalc
//!
//! A [`GeneratedProgram`](mapcalc_compiler::GeneratedProgram) becomes runnable
//! through a [`ProgramLoader`]: the loader yields a [`RuntimeFactory`], and
//! every instance it creates implements the [`Runtime`] contract. Jobs that
//! run whole images in the background go through the [`JobExecutor`].

pub mod cancellation;
pub mod config;
pub mod error;
pub mod executor;
pub mod interpreter;
pub mod loader;
pub mod progress;
pub mod runtime;
pub mod script;

pub use cancellation::CancellationToken;
pub use config::{ExecutorConfig, RuntimeConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use executor::{ExecutorState, ExecutorStats, ImageBindings, JobEvent, JobExecutor, JobId, JobListener, JobStatus};
pub use interpreter::Interpreter;
pub use loader::{InterpreterLoader, ProgramLoader, RuntimeFactory};
pub use progress::{ProgressListener, ProgressTracker, UpdateInterval};
pub use runtime::Runtime;
pub use script::MapScript;
