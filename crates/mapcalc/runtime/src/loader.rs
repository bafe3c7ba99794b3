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

//! Turning generated programs into runtime instances

use crate::config::RuntimeConfig;
use crate::error::{RuntimeError, RuntimeResult};
use crate::interpreter::Interpreter;
use crate::runtime::Runtime;
use mapcalc_compiler::{EvaluationModel, GeneratedProgram};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Creates runtime instances of one loaded program
pub trait RuntimeFactory: Send + Sync + fmt::Debug {
    fn program(&self) -> &Arc<GeneratedProgram>;

    /// Fresh instance with unbound images and initial variable values
    fn instantiate(&self) -> Box<dyn Runtime>;
}

/// Makes a generated program executable
pub trait ProgramLoader: Send + Sync + fmt::Debug {
    fn load(&self, program: Arc<GeneratedProgram>) -> RuntimeResult<Arc<dyn RuntimeFactory>>;
}

/// Loader whose instances interpret the program IR directly
#[derive(Debug, Clone, Default)]
pub struct InterpreterLoader {
    config: RuntimeConfig,
}

impl InterpreterLoader {
    pub fn new(config: RuntimeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }
}

impl ProgramLoader for InterpreterLoader {
    fn load(&self, program: Arc<GeneratedProgram>) -> RuntimeResult<Arc<dyn RuntimeFactory>> {
        if program.model() == EvaluationModel::Indirect && (program.result_slot().is_none() || program.destinations().len() != 1) {
            return Err(RuntimeError::Configuration("indirect program needs a result slot and exactly one destination".to_string()));
        }
        debug!(model = ?program.model(), locals = program.local_count(), "program loaded");
        Ok(Arc::new(InterpreterFactory {
            program,
            config: self.config.clone(),
        }))
    }
}

#[derive(Debug)]
struct InterpreterFactory {
    program: Arc<GeneratedProgram>,
    config: RuntimeConfig,
}

impl RuntimeFactory for InterpreterFactory {
    fn program(&self) -> &Arc<GeneratedProgram> {
        &self.program
    }

    fn instantiate(&self) -> Box<dyn Runtime> {
        Box::new(Interpreter::new(Arc::clone(&self.program), &self.config))
    }
}
