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

//! Job completion listeners

use super::job::{JobEvent, JobStatus, panic_message};
use parking_lot::RwLock;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::error;

/// Receives job events on the executor's polling thread
///
/// Callbacks run synchronously, one listener after another, so they should
/// return quickly and hand long work elsewhere.
pub trait JobListener: Send + Sync {
    fn on_completion(&self, event: &JobEvent);

    fn on_failure(&self, event: &JobEvent);
}

fn same(a: &Arc<dyn JobListener>, b: &Arc<dyn JobListener>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Registered listeners in registration order
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    listeners: RwLock<Vec<Arc<dyn JobListener>>>,
}

impl ListenerRegistry {
    /// Register a listener; registering it again has no effect
    pub fn add(&self, listener: Arc<dyn JobListener>) {
        let mut listeners = self.listeners.write();
        if !listeners.iter().any(|l| same(l, &listener)) {
            listeners.push(listener);
        }
    }

    /// Unregister a listener, returning whether it was registered
    pub fn remove(&self, listener: &Arc<dyn JobListener>) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|l| !same(l, listener));
        listeners.len() != before
    }

    pub fn contains(&self, listener: &Arc<dyn JobListener>) -> bool {
        self.listeners.read().iter().any(|l| same(l, listener))
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    /// Hand an event to every listener; the lock is released before any callback runs
    pub fn dispatch(&self, event: &JobEvent) {
        let listeners = self.listeners.read().clone();
        for listener in listeners {
            // A panicking listener must not stop delivery to the rest or kill the poller
            let delivered = panic::catch_unwind(AssertUnwindSafe(|| match event.status {
                JobStatus::Failed => listener.on_failure(event),
                _ => listener.on_completion(event),
            }));
            if let Err(payload) = delivered {
                let message = panic_message(payload.as_ref());
                error!(job = %event.job_id, %message, "job listener panicked");
            }
        }
    }
}
