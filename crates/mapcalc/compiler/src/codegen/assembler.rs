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

//! Program assembler: turns an analyzed script into a [`GeneratedProgram`]

use super::config::CompilerConfig;
use super::context::AssemblyContext;
use super::error::{AssemblyError, AssemblyResult};
use super::pipeline::AssemblyPipeline;
use super::program::GeneratedProgram;
use super::sections::standard_generators;
use crate::analysis::AnalyzedScript;
use crate::catalog::OptionCatalog;
use tracing::{debug, info};

/// Assembles generated programs with a fixed configuration
pub struct ProgramAssembler<'a> {
    config: &'a CompilerConfig,
    options: &'a OptionCatalog,
}

impl<'a> ProgramAssembler<'a> {
    pub fn new(config: &'a CompilerConfig, options: &'a OptionCatalog) -> Self {
        Self { config, options }
    }

    /// Assemble every section of the program
    pub fn assemble(&self, analyzed: &AnalyzedScript) -> AssemblyResult<GeneratedProgram> {
        self.config.validate().map_err(AssemblyError::Configuration)?;
        let mut context = AssemblyContext::new(analyzed, self.config, self.options)?;
        let sections = AssemblyPipeline::new().run(standard_generators(), &mut context)?;
        debug!(sections = sections.len(), "program sections generated");
        let slots = context.slots();
        let program = GeneratedProgram::from_sections(self.config.model, sections, slots)
            .ok_or_else(|| AssemblyError::Internal("assembly finished with a section missing".into()))?;
        info!(
            model = ?program.model(),
            sources = program.sources().len(),
            destinations = program.destinations().len(),
            image_vars = program.image_var_count(),
            locals = program.local_count(),
            "program assembled"
        );
        Ok(program)
    }
}
