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

//! Compiler facade tying parsing, analysis and assembly together

use crate::analysis::{AnalyzedScript, Analyzer, Diagnostics, ImageRoles};
use crate::ast::Script;
use crate::catalog::{FunctionCatalog, OptionCatalog};
use crate::codegen::{CompilerConfig, GeneratedProgram, ProgramAssembler};
use crate::error::{CompileError, CompileResult};
use crate::parser;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A successfully compiled script
#[derive(Debug, Clone)]
pub struct CompiledProgram {
    pub program: Arc<GeneratedProgram>,
    /// Warnings raised by analysis
    pub warnings: Diagnostics,
}

/// Script compiler
#[derive(Debug, Clone)]
pub struct Compiler {
    config: CompilerConfig,
    functions: Arc<FunctionCatalog>,
    options: Arc<OptionCatalog>,
}

impl Compiler {
    /// Compiler with the standard catalogs
    pub fn new(config: CompilerConfig) -> CompileResult<Self> {
        Self::with_catalogs(config, Arc::new(FunctionCatalog::standard()), Arc::new(OptionCatalog::standard()))
    }

    /// Compiler with caller-supplied catalogs
    pub fn with_catalogs(config: CompilerConfig, functions: Arc<FunctionCatalog>, options: Arc<OptionCatalog>) -> CompileResult<Self> {
        config.validate().map_err(CompileError::Configuration)?;
        Ok(Self { config, functions, options })
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn functions(&self) -> &Arc<FunctionCatalog> {
        &self.functions
    }

    pub fn options(&self) -> &Arc<OptionCatalog> {
        &self.options
    }

    /// Parse script text
    pub fn parse(&self, source: &str) -> CompileResult<Script> {
        Ok(parser::parse(source)?)
    }

    /// Run semantic analysis on a parsed script
    pub fn analyze(&self, script: Script, roles: &ImageRoles) -> CompileResult<AnalyzedScript> {
        let analyzer = Analyzer::new(&self.functions, &self.options).with_max_loop_nesting(self.config.max_loop_nesting);
        let analyzed = analyzer.analyze(script, roles)?;
        for warning in analyzed.warnings.warnings() {
            warn!(%warning, "script warning");
        }
        Ok(analyzed)
    }

    /// Compile an already parsed script
    pub fn compile_tree(&self, script: Script, roles: &ImageRoles) -> CompileResult<CompiledProgram> {
        let analyzed = self.analyze(script, roles)?;
        let program = ProgramAssembler::new(&self.config, &self.options).assemble(&analyzed)?;
        Ok(CompiledProgram {
            program: Arc::new(program),
            warnings: analyzed.warnings,
        })
    }

    /// Parse and compile script text
    pub fn compile_source(&self, source: &str, roles: &ImageRoles) -> CompileResult<CompiledProgram> {
        debug!(model = ?self.config.model, bytes = source.len(), "compiling script");
        let script = self.parse(source)?;
        let compiled = self.compile_tree(script, roles);
        match &compiled {
            Ok(compiled) => info!(warnings = compiled.warnings.len(), "script compiled"),
            Err(err) if err.is_internal() => warn!(error = %err, "internal compiler error"),
            Err(err) => debug!(error = %err, "script rejected"),
        }
        compiled
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self {
            config: CompilerConfig::default(),
            functions: Arc::new(FunctionCatalog::standard()),
            options: Arc::new(OptionCatalog::standard()),
        }
    }
}
