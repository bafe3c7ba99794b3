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

//! Shared state for section generators

use super::config::CompilerConfig;
use super::error::{AssemblyError, AssemblyResult};
use super::ir::EvaluationModel;
use super::program::{Declarations, SlotCounts};
use crate::analysis::AnalyzedScript;
use crate::catalog::OptionCatalog;

/// State threaded through every section generator of one assembly run
pub struct AssemblyContext<'a> {
    pub analyzed: &'a AnalyzedScript,
    pub config: &'a CompilerConfig,
    pub options: &'a OptionCatalog,
    declarations: Option<Declarations>,
    slots: SlotCounts,
}

impl<'a> AssemblyContext<'a> {
    /// Create a context; the Indirect model reserves a result slot up front
    pub fn new(analyzed: &'a AnalyzedScript, config: &'a CompilerConfig, options: &'a OptionCatalog) -> AssemblyResult<Self> {
        let mut slots = SlotCounts {
            locals: analyzed.local_count,
            ..Default::default()
        };
        if config.model == EvaluationModel::Indirect {
            if analyzed.destinations.len() != 1 {
                return Err(AssemblyError::Unsupported(format!(
                    "the indirect model needs exactly one destination image, found {}",
                    analyzed.destinations.len()
                )));
            }
            slots.result = Some(slots.locals);
            slots.locals += 1;
        }
        Ok(Self {
            analyzed,
            config,
            options,
            declarations: None,
            slots,
        })
    }

    pub fn model(&self) -> EvaluationModel {
        self.config.model
    }

    /// Record the declarations section for later sections to consult
    pub fn set_declarations(&mut self, declarations: Declarations) {
        self.declarations = Some(declarations);
    }

    /// Declarations emitted earlier in the pipeline
    pub fn declarations(&self) -> AssemblyResult<&Declarations> {
        self.declarations
            .as_ref()
            .ok_or_else(|| AssemblyError::Internal("declarations section has not been generated".into()))
    }

    /// Allocate a fresh array slot for a `foreach` list
    pub fn allocate_array(&mut self) -> usize {
        self.slots.arrays += 1;
        self.slots.arrays - 1
    }

    pub fn result_slot(&self) -> AssemblyResult<usize> {
        self.slots
            .result
            .ok_or_else(|| AssemblyError::Internal("no result slot outside the indirect model".into()))
    }

    pub fn slots(&self) -> SlotCounts {
        self.slots
    }
}
