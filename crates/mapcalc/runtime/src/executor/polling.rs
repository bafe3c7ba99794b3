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

//! Completion polling and the graceful drain check

use super::shared::{ExecutorShared, ExecutorState};
use crate::error::{RuntimeError, RuntimeResult};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

/// The executor's single polling thread, started on first submission
pub(crate) struct Poller {
    interval: Duration,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    pub fn new(interval: Duration) -> Self {
        Self { interval, handle: None }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_started(&self) -> bool {
        self.handle.is_some()
    }

    /// Change the interval; refused once the thread runs
    pub fn set_interval(&mut self, interval: Duration) -> bool {
        if self.is_started() {
            return false;
        }
        self.interval = interval;
        true
    }

    pub fn ensure_started(&mut self, shared: &Arc<ExecutorShared>) -> RuntimeResult<()> {
        if self.is_started() {
            return Ok(());
        }
        let shared = Arc::clone(shared);
        let interval = self.interval;
        let handle = thread::Builder::new()
            .name("mapcalc-poller".to_string())
            .spawn(move || poll_loop(&shared, interval))
            .map_err(|e| RuntimeError::Configuration(format!("cannot start polling thread: {e}")))?;
        debug!(?interval, "polling started");
        self.handle = Some(handle);
        Ok(())
    }
}

fn poll_loop(shared: &ExecutorShared, interval: Duration) {
    while !shared.sleep(interval) {
        let dispatched = shared.poll();
        if dispatched > 0 {
            debug!(dispatched, "completion poll");
        }
    }
    debug!("polling stopped");
}

/// Watch a draining executor and terminate it once every event is out
pub(crate) fn spawn_drain_check(shared: Arc<ExecutorShared>, interval: Duration) -> RuntimeResult<JoinHandle<()>> {
    thread::Builder::new()
        .name("mapcalc-drain".to_string())
        .spawn(move || {
            loop {
                if shared.is_drained() {
                    shared.transition(ExecutorState::Terminated);
                    break;
                }
                if shared.sleep(interval) {
                    break;
                }
            }
            debug!("drain check finished");
        })
        .map_err(|e| RuntimeError::Configuration(format!("cannot start drain check: {e}")))
}
