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

//! State shared between the executor handle, its workers and its poller

use super::job::{Job, JobEvent, JobId, JobStatus};
use super::listener::ListenerRegistry;
use crate::cancellation::CancellationToken;
use crate::error::{RuntimeError, RuntimeResult};
use parking_lot::{Condvar, Mutex};
use std::collections::{BTreeSet, VecDeque};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Lifecycle of an executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExecutorState {
    /// Accepting submissions
    #[default]
    Active,
    /// Refusing submissions while submitted jobs finish
    Draining,
    Terminated,
}

/// Counters over the life of an executor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutorStats {
    pub submitted: usize,
    pub completed: usize,
    pub failed: usize,
    /// Jobs dropped by an immediate shutdown before they started
    pub abandoned: usize,
    /// Pixels evaluated by completed jobs
    pub pixels: u64,
    pub total_execution_time: Duration,
    pub max_execution_time: Duration,
}

/// Terminal statuses kept for `JobExecutor::job_status` lookups
const FINISHED_HISTORY: usize = 1024;

#[derive(Default)]
pub(crate) struct ExecutorShared {
    state: Mutex<ExecutorState>,
    state_changed: Condvar,
    /// Submitted jobs whose event has not been dispatched yet
    outstanding: Mutex<BTreeSet<JobId>>,
    /// Submitted jobs no worker has picked up yet
    queued: Mutex<BTreeSet<JobId>>,
    /// Finished jobs waiting for the poller
    completions: Mutex<VecDeque<JobEvent>>,
    /// Most recently dispatched jobs, oldest first
    finished: Mutex<VecDeque<(JobId, JobStatus)>>,
    pub listeners: ListenerRegistry,
    pub cancellation: CancellationToken,
    stats: Mutex<ExecutorStats>,
}

impl ExecutorShared {
    pub fn state(&self) -> ExecutorState {
        *self.state.lock()
    }

    /// Move to `next` unless already terminated, returning the state that was left
    pub fn transition(&self, next: ExecutorState) -> ExecutorState {
        let mut state = self.state.lock();
        let previous = *state;
        if previous != ExecutorState::Terminated && previous != next {
            *state = next;
            self.state_changed.notify_all();
            info!(from = ?previous, to = ?next, "executor state changed");
        }
        previous
    }

    /// Block until terminated or until `timeout` passes; true when terminated
    pub fn wait_terminated(&self, timeout: Duration) -> bool {
        let mut state = self.state.lock();
        let deadline = std::time::Instant::now() + timeout;
        while *state != ExecutorState::Terminated {
            if self.state_changed.wait_until(&mut state, deadline).timed_out() {
                return *state == ExecutorState::Terminated;
            }
        }
        true
    }

    /// Sleep for up to `interval`, waking early on a state change; true once terminated
    pub fn sleep(&self, interval: Duration) -> bool {
        let mut state = self.state.lock();
        if *state != ExecutorState::Terminated {
            self.state_changed.wait_for(&mut state, interval);
        }
        *state == ExecutorState::Terminated
    }

    /// Accept a job while active
    pub fn admit(&self, id: JobId) -> RuntimeResult<()> {
        let state = self.state.lock();
        if *state != ExecutorState::Active {
            return Err(RuntimeError::ExecutorShutdown);
        }
        self.outstanding.lock().insert(id);
        self.queued.lock().insert(id);
        self.stats.lock().submitted += 1;
        Ok(())
    }

    /// Worker entry point
    pub fn execute(&self, job: Job) {
        if !self.queued.lock().remove(&job.id) {
            debug!(job = %job.id, "job abandoned before it started");
            return;
        }
        let event = job.run();
        if self.state() == ExecutorState::Terminated {
            debug!(job = %event.job_id, "executor terminated, dropping job result");
            return;
        }
        self.completions.lock().push_back(event);
    }

    /// Dispatch every finished job; returns how many were dispatched
    pub fn poll(&self) -> usize {
        let ready: Vec<JobEvent> = self.completions.lock().drain(..).collect();
        for event in &ready {
            match event.status {
                JobStatus::Failed => {
                    let error = event.error.as_ref().map(ToString::to_string).unwrap_or_default();
                    warn!(job = %event.job_id, %error, "job failed");
                }
                _ => info!(job = %event.job_id, pixels = event.pixels, elapsed = ?event.elapsed, "job completed"),
            }
            self.record(event);
            self.listeners.dispatch(event);
            self.remember(event.job_id, event.status);
            self.outstanding.lock().remove(&event.job_id);
        }
        ready.len()
    }

    fn record(&self, event: &JobEvent) {
        let mut stats = self.stats.lock();
        match event.status {
            JobStatus::Failed => stats.failed += 1,
            _ => {
                stats.completed += 1;
                stats.pixels += event.pixels;
            }
        }
        stats.total_execution_time += event.elapsed;
        stats.max_execution_time = stats.max_execution_time.max(event.elapsed);
    }

    fn remember(&self, id: JobId, status: JobStatus) {
        let mut finished = self.finished.lock();
        if finished.len() == FINISHED_HISTORY {
            finished.pop_front();
        }
        finished.push_back((id, status));
    }

    /// Status of a job: `Pending` while outstanding, then its terminal
    /// status for as long as it stays in the finished history
    pub fn status(&self, id: JobId) -> Option<JobStatus> {
        if self.is_outstanding(id) {
            return Some(JobStatus::Pending);
        }
        self.finished.lock().iter().rev().find(|(finished, _)| *finished == id).map(|(_, status)| *status)
    }

    /// Whether every submitted job has had its event dispatched
    pub fn is_drained(&self) -> bool {
        self.outstanding.lock().is_empty()
    }

    pub fn in_flight(&self) -> usize {
        self.outstanding.lock().len()
    }

    pub fn is_outstanding(&self, id: JobId) -> bool {
        self.outstanding.lock().contains(&id)
    }

    /// Drop every job that has not started, returning their ids
    pub fn abandon_all(&self) -> Vec<JobId> {
        let abandoned: Vec<JobId> = std::mem::take(&mut *self.queued.lock()).into_iter().collect();
        self.outstanding.lock().clear();
        self.completions.lock().clear();
        self.stats.lock().abandoned += abandoned.len();
        abandoned
    }

    pub fn stats(&self) -> ExecutorStats {
        self.stats.lock().clone()
    }
}
