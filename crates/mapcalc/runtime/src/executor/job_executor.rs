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

//! The job executor

use super::job::{ImageBindings, Job, JobId, JobStatus};
use super::listener::JobListener;
use super::polling::{Poller, spawn_drain_check};
use super::shared::{ExecutorShared, ExecutorState, ExecutorStats};
use crate::config::ExecutorConfig;
use crate::error::{RuntimeError, RuntimeResult};
use crate::progress::ProgressListener;
use crate::script::MapScript;
use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Runs scripts over whole images on a worker pool
///
/// Every submitted job ends in exactly one completion or failure event,
/// dispatched to the registered listeners from a single polling thread,
/// unless the executor is shut down immediately.
pub struct JobExecutor {
    config: ExecutorConfig,
    pool: ThreadPool,
    shared: Arc<ExecutorShared>,
    poller: Mutex<Poller>,
}

impl JobExecutor {
    pub fn new(config: ExecutorConfig) -> RuntimeResult<Self> {
        config.validate().map_err(RuntimeError::Configuration)?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.worker_threads)
            .thread_name(|i| format!("mapcalc-worker-{i}"))
            .build()
            .map_err(|e| RuntimeError::Configuration(e.to_string()))?;
        info!(workers = pool.current_num_threads(), "job executor created");
        Ok(Self {
            poller: Mutex::new(Poller::new(config.polling_interval())),
            config,
            pool,
            shared: Arc::new(ExecutorShared::default()),
        })
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn state(&self) -> ExecutorState {
        self.shared.state()
    }

    pub fn is_terminated(&self) -> bool {
        self.state() == ExecutorState::Terminated
    }

    /// Queue a script for evaluation over the bound images
    ///
    /// The script is compiled and its images bound before anything is
    /// queued; if either fails the error is returned here, no job id is
    /// issued and no event will ever be dispatched.
    pub fn submit(&self, script: &MapScript, images: ImageBindings, progress: Option<Box<dyn ProgressListener>>) -> RuntimeResult<JobId> {
        if self.state() != ExecutorState::Active {
            return Err(RuntimeError::ExecutorShutdown);
        }
        let mut runtime = script.runtime_instance()?;
        images.apply(runtime.as_mut())?;
        runtime.attach_cancellation(self.shared.cancellation.clone());

        let id = JobId::next();
        self.poller.lock().ensure_started(&self.shared)?;
        self.shared.admit(id)?;
        info!(job = %id, "job submitted");

        let job = Job { id, images, runtime, progress };
        let shared = Arc::clone(&self.shared);
        self.pool.spawn(move || shared.execute(job));
        Ok(id)
    }

    /// Set the polling interval; ignored once the first job was submitted
    pub fn set_polling_interval(&self, interval: Duration) {
        if interval.is_zero() {
            warn!("polling interval must be greater than 0, interval change ignored");
            return;
        }
        if !self.poller.lock().set_interval(interval) {
            warn!(?interval, "polling already started, interval change ignored");
        }
    }

    pub fn polling_interval(&self) -> Duration {
        self.poller.lock().interval()
    }

    pub fn add_listener(&self, listener: Arc<dyn JobListener>) {
        self.shared.listeners.add(listener);
    }

    /// Unregister a listener; a listener that was never added is ignored
    pub fn remove_listener(&self, listener: &Arc<dyn JobListener>) {
        self.shared.listeners.remove(listener);
    }

    pub fn is_listening(&self, listener: &Arc<dyn JobListener>) -> bool {
        self.shared.listeners.contains(listener)
    }

    /// `Pending` until the job's event is dispatched, then `Completed` or
    /// `Failed` while it is among the most recently finished jobs
    ///
    /// Unknown ids, jobs dropped by an immediate shutdown and jobs that
    /// aged out of the history give `None`.
    pub fn job_status(&self, id: JobId) -> Option<JobStatus> {
        self.shared.status(id)
    }

    /// Jobs submitted whose event has not been dispatched yet
    pub fn in_flight(&self) -> usize {
        self.shared.in_flight()
    }

    pub fn stats(&self) -> ExecutorStats {
        self.shared.stats()
    }

    /// Stop accepting jobs and terminate once every submitted job has reported
    pub fn shutdown(&self) -> RuntimeResult<()> {
        if self.shared.transition(ExecutorState::Draining) == ExecutorState::Active {
            spawn_drain_check(Arc::clone(&self.shared), self.config.drain_check_interval())?;
        }
        Ok(())
    }

    /// Terminate at once: running jobs are cancelled, queued jobs are dropped
    /// and no further events are dispatched. Returns the dropped jobs.
    pub fn shutdown_now(&self) -> Vec<JobId> {
        self.shared.transition(ExecutorState::Terminated);
        self.shared.cancellation.cancel(Some("executor shut down"));
        let abandoned = self.shared.abandon_all();
        if !abandoned.is_empty() {
            warn!(jobs = abandoned.len(), "queued jobs abandoned");
        }
        abandoned
    }

    /// Wait until the executor terminates; false if `timeout` passed first
    pub fn await_termination(&self, timeout: Duration) -> bool {
        self.shared.wait_terminated(timeout)
    }
}

impl Drop for JobExecutor {
    fn drop(&mut self) {
        if self.state() == ExecutorState::Active {
            self.shutdown_now();
        }
    }
}

impl fmt::Debug for JobExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobExecutor")
            .field("state", &self.state())
            .field("in_flight", &self.in_flight())
            .field("listeners", &self.shared.listeners.len())
            .finish()
    }
}
