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

//! Job executor scenarios

use mapcalc_common::{Bounds, Image, Raster};
use mapcalc_compiler::{ImageRole, ImageRoles};
use mapcalc_runtime::{ExecutorConfig, ImageBindings, JobEvent, JobExecutor, JobId, JobListener, JobStatus, MapScript, ProgressListener, RuntimeError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(10);

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn roles() -> ImageRoles {
    [("src".to_string(), ImageRole::Source), ("dest".to_string(), ImageRole::Destination)].into_iter().collect()
}

fn bindings(width: u32, height: u32) -> (ImageBindings, Arc<Raster>) {
    let src = Arc::new(Raster::from_fn(Bounds::sized(width, height), 1, |x, y, _| (x * 100 + y) as f64).unwrap());
    let dest = Arc::new(Raster::new(Bounds::sized(width, height), 1).unwrap());
    (ImageBindings::new().source("src", src).destination("dest", dest.clone()), dest)
}

/// Forwards every event to a channel
struct Forward(Mutex<Sender<JobEvent>>);

impl Forward {
    fn new() -> (Arc<Self>, Receiver<JobEvent>) {
        let (tx, rx) = mpsc::channel();
        (Arc::new(Self(Mutex::new(tx))), rx)
    }
}

impl JobListener for Forward {
    fn on_completion(&self, event: &JobEvent) {
        let _ = self.0.lock().send(event.clone());
    }

    fn on_failure(&self, event: &JobEvent) {
        let _ = self.0.lock().send(event.clone());
    }
}

fn executor() -> JobExecutor {
    init_tracing();
    JobExecutor::new(ExecutorConfig::with_workers(2)).unwrap()
}

#[test]
fn test_completed_job_dispatches_event() {
    let executor = executor();
    let (listener, events) = Forward::new();
    executor.add_listener(listener);

    let script = MapScript::new("init { n = 0; } dest = src + n++;", roles());
    let (images, dest) = bindings(4, 3);
    let id = executor.submit(&script, images, None).unwrap();

    let event = events.recv_timeout(WAIT).unwrap();
    assert_eq!(event.job_id, id);
    assert_eq!(event.status, JobStatus::Completed);
    assert!(event.is_success());
    assert_eq!(event.pixels, 12);
    assert_eq!(event.variable("n").unwrap(), 12.0);
    assert!(Arc::ptr_eq(&event.program, &script.program().unwrap()));
    assert!(event.images.get_source("src").is_some());
    assert_eq!(dest.sample(3, 2, 0), Some(302.0 + 11.0));

    executor.shutdown().unwrap();
    assert!(executor.await_termination(WAIT));
    assert_eq!(executor.stats().completed, 1);
}

#[test]
fn test_runtime_error_becomes_failure_event() {
    let executor = executor();
    let (listener, events) = Forward::new();
    executor.add_listener(listener);

    let failing = MapScript::new("dest = src[0, 1];", roles());
    let (images, _) = bindings(2, 2);
    let failed_id = executor.submit(&failing, images, None).unwrap();
    let event = events.recv_timeout(WAIT).unwrap();
    assert_eq!(event.job_id, failed_id);
    assert_eq!(event.status, JobStatus::Failed);
    assert!(matches!(event.error, Some(RuntimeError::OutOfBounds { .. })));

    // The executor keeps serving after a failure
    let fine = MapScript::new("dest = src;", roles());
    let (images, _) = bindings(2, 2);
    let id = executor.submit(&fine, images, None).unwrap();
    let event = events.recv_timeout(WAIT).unwrap();
    assert_eq!((event.job_id, event.status), (id, JobStatus::Completed));
    assert_eq!(executor.stats().failed, 1);
}

#[test]
fn test_invalid_script_fails_synchronously() {
    let executor = executor();
    let (listener, events) = Forward::new();
    executor.add_listener(listener);

    let script = MapScript::new("dest = src +;", roles());
    let (images, _) = bindings(2, 2);
    let err = executor.submit(&script, images, None).unwrap_err();
    assert!(matches!(err, RuntimeError::Compile(_)));
    assert_eq!(executor.in_flight(), 0);
    assert_eq!(executor.stats().submitted, 0);

    executor.shutdown().unwrap();
    assert!(executor.await_termination(WAIT));
    assert!(events.try_recv().is_err());
}

#[test]
fn test_polling_interval_is_fixed_by_first_submit() {
    let executor = executor();
    executor.set_polling_interval(Duration::from_millis(5));
    assert_eq!(executor.polling_interval(), Duration::from_millis(5));

    let (listener, events) = Forward::new();
    executor.add_listener(listener);
    let script = MapScript::new("dest = src;", roles());
    let (images, _) = bindings(1, 1);
    executor.submit(&script, images, None).unwrap();

    executor.set_polling_interval(Duration::from_secs(3600));
    assert_eq!(executor.polling_interval(), Duration::from_millis(5));

    // A second job is still picked up at the original cadence
    let (images, _) = bindings(1, 1);
    executor.submit(&script, images, None).unwrap();
    for _ in 0..2 {
        events.recv_timeout(WAIT).unwrap();
    }
}

#[test]
fn test_listener_registration() {
    let executor = executor();
    let (listener, _events) = Forward::new();
    let listener: Arc<dyn JobListener> = listener;
    assert!(!executor.is_listening(&listener));
    executor.remove_listener(&listener);

    executor.add_listener(Arc::clone(&listener));
    assert!(executor.is_listening(&listener));
    executor.remove_listener(&listener);
    assert!(!executor.is_listening(&listener));
}

#[test]
fn test_graceful_shutdown_reports_every_job() {
    let executor = executor();
    let (listener, events) = Forward::new();
    executor.add_listener(listener);

    let script = MapScript::new("s = 0; foreach (i in 1:50) { s += src[0, 0] * i; } dest = s;", roles());
    let mut ids = Vec::new();
    for _ in 0..6 {
        let (images, _) = bindings(20, 20);
        ids.push(executor.submit(&script, images, None).unwrap());
    }
    executor.shutdown().unwrap();
    let (images, _) = bindings(1, 1);
    assert!(matches!(executor.submit(&script, images, None), Err(RuntimeError::ExecutorShutdown)));

    assert!(executor.await_termination(WAIT));
    let mut seen: Vec<JobId> = events.try_iter().map(|event| event.job_id).collect();
    seen.sort();
    assert_eq!(seen, ids);
    assert_eq!(executor.in_flight(), 0);
}

#[test]
fn test_immediate_shutdown_stops_dispatch() {
    let executor = JobExecutor::new(ExecutorConfig::with_workers(1)).unwrap();
    let (listener, events) = Forward::new();
    executor.add_listener(listener);

    let script = MapScript::new("while (1) { breakif (x() < 0); } dest = 1;", roles());
    let mut ids = Vec::new();
    for _ in 0..3 {
        let (images, _) = bindings(2, 2);
        ids.push(executor.submit(&script, images, None).unwrap());
    }
    let abandoned = executor.shutdown_now();
    assert!(executor.is_terminated());
    assert!(abandoned.len() >= 2);
    assert!(abandoned.iter().all(|id| ids.contains(id)));
    assert!(executor.await_termination(Duration::from_millis(10)));
    std::thread::sleep(Duration::from_millis(100));
    assert!(events.try_recv().is_err());
}

#[test]
fn test_job_status_while_pending() {
    let executor = JobExecutor::new(ExecutorConfig::with_workers(1)).unwrap();
    let script = MapScript::new("while (1) { breakif (x() < 0); } dest = 1;", roles());
    let (images, _) = bindings(1, 1);
    let id = executor.submit(&script, images, None).unwrap();
    assert_eq!(executor.job_status(id), Some(JobStatus::Pending));
    executor.shutdown_now();
}

/// Progress listener that fails on its first update
struct Exploding;

impl ProgressListener for Exploding {
    fn update(&mut self, _done: u64) {
        panic!("progress listener exploded");
    }
}

/// Job listener that fails on every event
struct Faulty;

impl JobListener for Faulty {
    fn on_completion(&self, _event: &JobEvent) {
        panic!("completion handler exploded");
    }

    fn on_failure(&self, _event: &JobEvent) {
        panic!("failure handler exploded");
    }
}

#[test]
fn test_panicking_job_becomes_failure_event() {
    let executor = executor();
    let (listener, events) = Forward::new();
    executor.add_listener(listener);

    let script = MapScript::new("dest = 1;", roles());
    let (images, _) = bindings(3, 3);
    let panicked = executor.submit(&script, images, Some(Box::new(Exploding))).unwrap();
    let (images, dest) = bindings(3, 3);
    let fine = executor.submit(&script, images, None).unwrap();

    executor.shutdown().unwrap();
    assert!(executor.await_termination(WAIT));
    let mut seen: Vec<JobEvent> = events.try_iter().collect();
    seen.sort_by_key(|event| event.job_id);
    assert_eq!(seen.len(), 2);
    assert_eq!((seen[0].job_id, seen[0].status), (panicked, JobStatus::Failed));
    assert!(matches!(&seen[0].error, Some(RuntimeError::JobPanicked(message)) if message.contains("exploded")));
    assert_eq!((seen[1].job_id, seen[1].status), (fine, JobStatus::Completed));
    assert_eq!(dest.sample(2, 2, 0), Some(1.0));
    assert_eq!(executor.stats().failed, 1);
}

#[test]
fn test_panicking_listener_does_not_stop_delivery() {
    let executor = executor();
    executor.add_listener(Arc::new(Faulty));
    let (listener, events) = Forward::new();
    executor.add_listener(listener);

    let script = MapScript::new("dest = src;", roles());
    for _ in 0..2 {
        let (images, _) = bindings(2, 2);
        executor.submit(&script, images, None).unwrap();
    }
    for _ in 0..2 {
        assert_eq!(events.recv_timeout(WAIT).unwrap().status, JobStatus::Completed);
    }
    executor.shutdown().unwrap();
    assert!(executor.await_termination(WAIT));
}

#[test]
fn test_job_status_after_dispatch() {
    let executor = executor();
    let ok = MapScript::new("dest = src;", roles());
    let failing = MapScript::new("dest = src[0, 5];", roles());
    let (images, _) = bindings(2, 2);
    let completed = executor.submit(&ok, images, None).unwrap();
    let (images, _) = bindings(2, 2);
    let failed = executor.submit(&failing, images, None).unwrap();

    executor.shutdown().unwrap();
    assert!(executor.await_termination(WAIT));
    assert_eq!(executor.job_status(completed), Some(JobStatus::Completed));
    assert_eq!(executor.job_status(failed), Some(JobStatus::Failed));
}
