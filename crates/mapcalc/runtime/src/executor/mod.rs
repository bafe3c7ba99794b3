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

//! Background execution of scripts
//!
//! Jobs run on a worker pool; a single polling thread picks up finished jobs
//! and dispatches their events to the registered [`JobListener`]s.

mod job;
mod job_executor;
mod listener;
mod polling;
mod shared;

pub use job::{ImageBindings, JobEvent, JobId, JobStatus};
pub use job_executor::JobExecutor;
pub use listener::JobListener;
pub use shared::{ExecutorState, ExecutorStats};
