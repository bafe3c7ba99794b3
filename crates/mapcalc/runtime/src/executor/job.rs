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

//! Jobs and the events they produce

use crate::error::{RuntimeError, RuntimeResult};
use crate::progress::ProgressListener;
use crate::runtime::Runtime;
use mapcalc_common::{SharedImage, SharedWritableImage};
use mapcalc_compiler::GeneratedProgram;
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error};

static NEXT_JOB_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide unique job identifier, increasing with every submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(u64);

impl JobId {
    pub(crate) fn next() -> Self {
        JobId(NEXT_JOB_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    /// Submitted, and no event has been dispatched yet
    Pending,
    Completed,
    Failed,
}

/// Images bound to a job, in binding order
#[derive(Clone, Default)]
pub struct ImageBindings {
    sources: Vec<(String, SharedImage)>,
    destinations: Vec<(String, SharedWritableImage)>,
}

impl ImageBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(mut self, name: impl Into<String>, image: SharedImage) -> Self {
        self.sources.push((name.into(), image));
        self
    }

    /// Add a destination; the first one added fixes the processing bounds
    pub fn destination(mut self, name: impl Into<String>, image: SharedWritableImage) -> Self {
        self.destinations.push((name.into(), image));
        self
    }

    pub fn get_source(&self, name: &str) -> Option<&SharedImage> {
        self.sources.iter().find(|(n, _)| n == name).map(|(_, image)| image)
    }

    pub fn get_destination(&self, name: &str) -> Option<&SharedWritableImage> {
        self.destinations.iter().find(|(n, _)| n == name).map(|(_, image)| image)
    }

    pub fn source_names(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|(name, _)| name.as_str())
    }

    pub fn destination_names(&self) -> impl Iterator<Item = &str> {
        self.destinations.iter().map(|(name, _)| name.as_str())
    }

    /// Bind every image to a runtime instance, destinations first
    pub fn apply(&self, runtime: &mut dyn Runtime) -> RuntimeResult<()> {
        for (name, image) in &self.destinations {
            runtime.bind_destination(name, Arc::clone(image))?;
        }
        for (name, image) in &self.sources {
            runtime.bind_source(name, Arc::clone(image))?;
        }
        Ok(())
    }
}

impl fmt::Debug for ImageBindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageBindings")
            .field("sources", &self.source_names().collect::<Vec<_>>())
            .field("destinations", &self.destination_names().collect::<Vec<_>>())
            .finish()
    }
}

/// Outcome of one job, handed to every registered listener
#[derive(Clone)]
pub struct JobEvent {
    pub job_id: JobId,
    pub status: JobStatus,
    pub program: Arc<GeneratedProgram>,
    pub images: ImageBindings,
    /// The instance that ran the job, for reading image-scope variables
    pub runtime: Arc<Mutex<Box<dyn Runtime>>>,
    pub error: Option<RuntimeError>,
    /// Pixels evaluated before the job ended
    pub pixels: u64,
    pub elapsed: Duration,
}

impl JobEvent {
    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Completed
    }

    /// Current value of an image-scope variable of the finished instance
    pub fn variable(&self, name: &str) -> RuntimeResult<f64> {
        self.runtime.lock().get_variable(name)
    }
}

impl fmt::Debug for JobEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobEvent")
            .field("job_id", &self.job_id)
            .field("status", &self.status)
            .field("images", &self.images)
            .field("error", &self.error)
            .field("pixels", &self.pixels)
            .field("elapsed", &self.elapsed)
            .finish()
    }
}

/// A bound runtime instance waiting for a worker
pub(crate) struct Job {
    pub id: JobId,
    pub images: ImageBindings,
    pub runtime: Box<dyn Runtime>,
    pub progress: Option<Box<dyn ProgressListener>>,
}

impl Job {
    /// Evaluate every pixel and turn the outcome into an event
    pub fn run(mut self) -> JobEvent {
        let started = Instant::now();
        debug!(job = %self.id, "job started");
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let progress = self.progress.as_mut().map(|listener| &mut **listener as &mut dyn ProgressListener);
            self.runtime.evaluate_all(progress)
        }))
        .unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            error!(job = %self.id, %message, "job panicked");
            Err(RuntimeError::JobPanicked(message))
        });
        let (status, pixels, error) = match outcome {
            Ok(pixels) => (JobStatus::Completed, pixels, None),
            Err(err) => (JobStatus::Failed, 0, Some(err)),
        };
        JobEvent {
            job_id: self.id,
            status,
            program: Arc::clone(self.runtime.program()),
            images: self.images,
            runtime: Arc::new(Mutex::new(self.runtime)),
            error,
            pixels,
            elapsed: started.elapsed(),
        }
    }
}

/// Text of a panic payload raised with a string message
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::MapScript;
    use mapcalc_common::{Bounds, Image, Raster};
    use mapcalc_compiler::{ImageRole, ImageRoles};

    #[test]
    fn test_ids_increase() {
        let a = JobId::next();
        let b = JobId::next();
        assert!(b > a);
        assert_eq!(a.to_string(), format!("job-{}", a.value()));
    }

    #[test]
    fn test_run_reports_failure_as_event() {
        let roles: ImageRoles = [("src".to_string(), ImageRole::Source), ("dest".to_string(), ImageRole::Destination)].into_iter().collect();
        let script = MapScript::new("dest = src[5, 0];", roles);
        let dest = Arc::new(Raster::new(Bounds::sized(2, 2), 1).unwrap());
        let images = ImageBindings::new()
            .source("src", Arc::new(Raster::new(Bounds::sized(2, 2), 1).unwrap()))
            .destination("dest", dest.clone());
        let mut runtime = script.runtime_instance().unwrap();
        images.apply(runtime.as_mut()).unwrap();
        let job = Job {
            id: JobId::next(),
            images,
            runtime,
            progress: None,
        };
        let event = job.run();
        assert_eq!(event.status, JobStatus::Failed);
        assert!(matches!(event.error, Some(RuntimeError::OutOfBounds { .. })));
        assert!(event.images.get_destination("dest").is_some());
        assert_eq!(dest.sample(0, 0, 0), Some(0.0));
    }

    struct Exploding;

    impl ProgressListener for Exploding {
        fn update(&mut self, _done: u64) {
            panic!("listener exploded");
        }
    }

    #[test]
    fn test_run_turns_panic_into_failure() {
        let roles: ImageRoles = [("dest".to_string(), ImageRole::Destination)].into_iter().collect();
        let script = MapScript::new("dest = 1;", roles);
        let images = ImageBindings::new().destination("dest", Arc::new(Raster::new(Bounds::sized(2, 2), 1).unwrap()));
        let mut runtime = script.runtime_instance().unwrap();
        images.apply(runtime.as_mut()).unwrap();
        let job = Job {
            id: JobId::next(),
            images,
            runtime,
            progress: Some(Box::new(Exploding)),
        };
        let event = job.run();
        assert_eq!(event.status, JobStatus::Failed);
        assert!(matches!(&event.error, Some(RuntimeError::JobPanicked(message)) if message == "listener exploded"));
    }

    #[test]
    fn test_panic_message() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&7_u32), "non-string panic payload");
    }
}
