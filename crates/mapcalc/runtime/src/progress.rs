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

//! Progress reporting for whole-image evaluation

/// How often a listener wants to hear about progress
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateInterval {
    /// Every `n` pixels
    Pixels(u64),
    /// Every time this fraction of the task completes, in `(0, 1]`
    Proportion(f64),
}

impl UpdateInterval {
    /// Pixel step for a task of `total` pixels, never zero
    pub fn step(self, total: u64) -> u64 {
        let step = match self {
            UpdateInterval::Pixels(n) => n,
            UpdateInterval::Proportion(p) if p.is_finite() && p > 0.0 => (total as f64 * p.min(1.0)).ceil() as u64,
            UpdateInterval::Proportion(_) => total,
        };
        step.max(1)
    }
}

/// Receives progress of [`Runtime::evaluate_all`](crate::Runtime::evaluate_all)
pub trait ProgressListener: Send {
    fn update_interval(&self) -> UpdateInterval {
        UpdateInterval::Proportion(0.01)
    }

    /// Number of pixels the task will evaluate, called before `start`
    fn set_task_size(&mut self, _pixels: u64) {}

    fn start(&mut self) {}

    /// Cumulative number of pixels evaluated so far
    fn update(&mut self, done: u64);

    fn finish(&mut self) {}
}

/// Counts evaluated pixels and forwards updates at the listener's interval
pub struct ProgressTracker<'a> {
    listener: Option<&'a mut dyn ProgressListener>,
    step: u64,
    pending: u64,
    done: u64,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(mut listener: Option<&'a mut dyn ProgressListener>, total: u64) -> Self {
        let step = match listener.as_deref_mut() {
            Some(listener) => {
                let step = listener.update_interval().step(total);
                listener.set_task_size(total);
                step
            }
            None => u64::MAX,
        };
        Self { listener, step, pending: 0, done: 0 }
    }

    pub fn start(&mut self) {
        if let Some(listener) = self.listener.as_deref_mut() {
            listener.start();
        }
    }

    /// Record one evaluated pixel
    pub fn advance(&mut self) {
        self.done += 1;
        self.pending += 1;
        if self.pending >= self.step {
            self.pending = 0;
            if let Some(listener) = self.listener.as_deref_mut() {
                listener.update(self.done);
            }
        }
    }

    pub fn finish(&mut self) {
        if let Some(listener) = self.listener.as_deref_mut() {
            listener.finish();
        }
    }

    pub fn done(&self) -> u64 {
        self.done
    }
}
