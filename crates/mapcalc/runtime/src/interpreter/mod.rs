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

//! Tree-walking interpreter for generated programs

mod eval;

use crate::cancellation::CancellationToken;
use crate::config::RuntimeConfig;
use crate::error::{RuntimeError, RuntimeResult};
use crate::runtime::Runtime;
use eval::{Flow, Frame};
use mapcalc_common::{Bounds, SharedImage, SharedWritableImage};
use mapcalc_compiler::catalog::OutsidePolicy;
use mapcalc_compiler::{EvaluationModel, GeneratedProgram};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Runtime instance that walks the program's IR directly
pub struct Interpreter {
    program: Arc<GeneratedProgram>,
    outside: OutsidePolicy,
    sources: Vec<Option<SharedImage>>,
    destinations: Vec<Option<SharedWritableImage>>,
    bounds: Option<Bounds>,
    image_vars: Vec<f64>,
    /// Image-scope variables whose value was injected from outside
    overridden: Vec<bool>,
    locals: Vec<f64>,
    arrays: Vec<Vec<f64>>,
    rng: StdRng,
    cancellation: Option<CancellationToken>,
}

impl Interpreter {
    pub fn new(program: Arc<GeneratedProgram>, config: &RuntimeConfig) -> Self {
        let rng = match config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            outside: program.outside_policy(),
            sources: vec![None; program.sources().len()],
            destinations: vec![None; program.destinations().len()],
            bounds: None,
            image_vars: program.defaults().to_vec(),
            overridden: vec![false; program.image_var_count()],
            locals: vec![0.0; program.local_count()],
            arrays: vec![Vec::new(); program.array_count()],
            rng,
            cancellation: None,
            program,
        }
    }

    fn frame(&mut self, bounds: Bounds, x: i64, y: i64) -> Frame<'_> {
        Frame {
            program: &self.program,
            sources: &self.sources,
            destinations: &self.destinations,
            bounds,
            outside: self.outside,
            x,
            y,
            image_vars: &mut self.image_vars,
            locals: &mut self.locals,
            arrays: &mut self.arrays,
            rng: &mut self.rng,
            cancellation: self.cancellation.as_ref(),
        }
    }

    /// Evaluate the initializer of one image-scope variable at the bounds origin
    fn initialize(&mut self, slot: usize, bounds: Bounds) -> RuntimeResult<()> {
        let program = Arc::clone(&self.program);
        if let Some(init) = program.initializer_for(slot) {
            let value = self.frame(bounds, bounds.min_x, bounds.min_y).expr(&init.value)?;
            self.image_vars[slot] = value;
        }
        Ok(())
    }

    /// Run the image-scope initializer, leaving injected values in place
    fn initialize_all(&mut self, bounds: Bounds) -> RuntimeResult<()> {
        let program = Arc::clone(&self.program);
        for init in program.image_init() {
            if !self.overridden[init.slot] {
                self.initialize(init.slot, bounds)?;
            }
        }
        debug!(variables = program.image_var_count(), "image-scope variables initialized");
        Ok(())
    }

    fn variable_slot(&self, name: &str) -> RuntimeResult<usize> {
        self.program.variable_slot(name).ok_or_else(|| RuntimeError::UnknownVariable(name.to_string()))
    }

    fn destination(&self, name: &str) -> RuntimeResult<&SharedWritableImage> {
        let index = self.program.destination_index(name).ok_or_else(|| RuntimeError::UnknownImage(name.to_string()))?;
        self.destinations[index].as_ref().ok_or_else(|| RuntimeError::ImageNotBound(name.to_string()))
    }
}

impl Runtime for Interpreter {
    fn program(&self) -> &Arc<GeneratedProgram> {
        &self.program
    }

    fn bind_destination(&mut self, name: &str, image: SharedWritableImage) -> RuntimeResult<()> {
        let index = self.program.destination_index(name).ok_or_else(|| RuntimeError::UnknownImage(name.to_string()))?;
        let fix_bounds = self.bounds.is_none();
        let bounds = image.bounds();
        self.destinations[index] = Some(image);
        if fix_bounds {
            debug!(image = name, ?bounds, "processing bounds fixed");
            self.bounds = Some(bounds);
            self.initialize_all(bounds)?;
        }
        Ok(())
    }

    fn bind_source(&mut self, name: &str, image: SharedImage) -> RuntimeResult<()> {
        let index = self.program.source_index(name).ok_or_else(|| RuntimeError::UnknownImage(name.to_string()))?;
        self.sources[index] = Some(image);
        Ok(())
    }

    fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    fn evaluate(&mut self, x: i64, y: i64) -> RuntimeResult<Option<f64>> {
        let bounds = self.bounds.ok_or(RuntimeError::BoundsNotSet)?;
        let program = Arc::clone(&self.program);
        let flow = self.frame(bounds, x, y).block(program.body())?;
        Ok(match (program.model(), flow) {
            (EvaluationModel::Direct, _) => None,
            (EvaluationModel::Indirect, Flow::Return(value)) => Some(value),
            (EvaluationModel::Indirect, _) => Some(program.result_slot().map_or(f64::NAN, |slot| self.locals[slot])),
        })
    }

    fn write_result(&mut self, x: i64, y: i64, value: f64) -> RuntimeResult<()> {
        let name = self
            .program
            .destinations()
            .first()
            .cloned()
            .ok_or_else(|| RuntimeError::Configuration("program has no destination image".to_string()))?;
        self.write_sample(&name, x, y, 0, value)
    }

    fn read_sample(&self, source: &str, x: i64, y: i64, band: usize) -> RuntimeResult<f64> {
        let index = self.program.source_index(source).ok_or_else(|| RuntimeError::UnknownImage(source.to_string()))?;
        let image = self.sources[index].as_ref().ok_or_else(|| RuntimeError::ImageNotBound(source.to_string()))?;
        eval::read_source(image, source, self.outside, Some((x, y)), band)
    }

    fn write_sample(&self, destination: &str, x: i64, y: i64, band: usize, value: f64) -> RuntimeResult<()> {
        self.destination(destination)?.set_sample(x, y, band, value)?;
        Ok(())
    }

    fn get_variable(&self, name: &str) -> RuntimeResult<f64> {
        Ok(self.image_vars[self.variable_slot(name)?])
    }

    fn set_variable(&mut self, name: &str, value: Option<f64>) -> RuntimeResult<()> {
        let slot = self.variable_slot(name)?;
        match value {
            Some(value) => {
                self.image_vars[slot] = value;
                self.overridden[slot] = true;
            }
            None => {
                self.overridden[slot] = false;
                self.image_vars[slot] = self.program.defaults().get(slot).copied().unwrap_or(0.0);
                if let Some(bounds) = self.bounds {
                    self.initialize(slot, bounds)?;
                }
            }
        }
        Ok(())
    }

    fn attach_cancellation(&mut self, token: CancellationToken) {
        self.cancellation = Some(token);
    }

    fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancellation.as_ref()
    }
}

impl fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpreter")
            .field("model", &self.program.model())
            .field("bounds", &self.bounds)
            .field("image_vars", &self.image_vars)
            .finish()
    }
}
