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

//! The contract every instantiated program satisfies

use crate::cancellation::CancellationToken;
use crate::error::{RuntimeError, RuntimeResult};
use crate::progress::{ProgressListener, ProgressTracker};
use mapcalc_common::{Bounds, SharedImage, SharedWritableImage};
use mapcalc_compiler::{EvaluationModel, GeneratedProgram};
use std::sync::Arc;
use tracing::debug;

/// An executable instance of a generated program
///
/// An instance owns its image bindings and the current values of the
/// program's image-scope variables. Processing bounds are taken from the
/// first destination bound and stay fixed for the life of the instance.
pub trait Runtime: Send {
    /// Program this instance executes
    fn program(&self) -> &Arc<GeneratedProgram>;

    fn model(&self) -> EvaluationModel {
        self.program().model()
    }

    /// Bind a destination image; the first binding fixes the processing bounds
    fn bind_destination(&mut self, name: &str, image: SharedWritableImage) -> RuntimeResult<()>;

    fn bind_source(&mut self, name: &str, image: SharedImage) -> RuntimeResult<()>;

    /// Processing bounds, once a destination has been bound
    fn bounds(&self) -> Option<Bounds>;

    /// Run the per-pixel body at one coordinate
    ///
    /// In the direct model the body writes its destinations and this returns
    /// `None`; in the indirect model it returns the value for the caller to
    /// store with [`write_result`](Runtime::write_result).
    fn evaluate(&mut self, x: i64, y: i64) -> RuntimeResult<Option<f64>>;

    /// Store an indirect-model result in the single destination
    fn write_result(&mut self, x: i64, y: i64, value: f64) -> RuntimeResult<()>;

    /// Read a source sample, applying the outside policy beyond its bounds
    fn read_sample(&self, source: &str, x: i64, y: i64, band: usize) -> RuntimeResult<f64>;

    /// Write a destination sample; writes beyond the processing bounds are not checked here
    fn write_sample(&self, destination: &str, x: i64, y: i64, band: usize, value: f64) -> RuntimeResult<()>;

    fn get_variable(&self, name: &str) -> RuntimeResult<f64>;

    /// Override an image-scope variable, or with `None` restore its initial value
    fn set_variable(&mut self, name: &str, value: Option<f64>) -> RuntimeResult<()>;

    /// Names of the image-scope variables
    fn variable_names(&self) -> Vec<String> {
        self.program().image_vars().to_vec()
    }

    fn attach_cancellation(&mut self, token: CancellationToken);

    fn cancellation(&self) -> Option<&CancellationToken>;

    /// Evaluate every pixel of the processing bounds, rows top to bottom and
    /// left to right within a row, returning the number of pixels evaluated
    fn evaluate_all(&mut self, listener: Option<&mut dyn ProgressListener>) -> RuntimeResult<u64> {
        let bounds = self.bounds().ok_or(RuntimeError::BoundsNotSet)?;
        let mut tracker = ProgressTracker::new(listener, bounds.pixel_count());
        debug!(width = bounds.width, height = bounds.height, "evaluating all pixels");
        tracker.start();
        for y in bounds.min_y..=bounds.max_y() {
            if self.cancellation().is_some_and(CancellationToken::is_cancelled) {
                return Err(RuntimeError::Cancelled);
            }
            for x in bounds.min_x..=bounds.max_x() {
                if let Some(value) = self.evaluate(x, y)? {
                    self.write_result(x, y, value)?;
                }
                tracker.advance();
            }
        }
        tracker.finish();
        Ok(tracker.done())
    }
}
