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

//! Compilation errors

use crate::analysis::Diagnostics;
use crate::codegen::AssemblyError;
use crate::parser::ParseError;
use thiserror::Error;

/// Errors that can occur while compiling a script
#[derive(Error, Debug, Clone)]
pub enum CompileError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// The script broke one or more semantic rules
    #[error("Script has {} error(s):\n{0}", .0.errors().count())]
    Diagnostics(Diagnostics),

    /// Analyzer and assembler disagree; not caused by the script itself
    #[error("Internal compiler error: {0}")]
    Internal(String),

    /// The script is valid but cannot be compiled for the requested model
    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<AssemblyError> for CompileError {
    fn from(err: AssemblyError) -> Self {
        match err {
            AssemblyError::Internal(message) => CompileError::Internal(message),
            AssemblyError::Unsupported(message) => CompileError::Unsupported(message),
            AssemblyError::Configuration(message) => CompileError::Configuration(message),
        }
    }
}

impl From<Diagnostics> for CompileError {
    fn from(diagnostics: Diagnostics) -> Self {
        CompileError::Diagnostics(diagnostics)
    }
}

impl CompileError {
    /// Diagnostics carried by the error, if it came from analysis
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            CompileError::Diagnostics(diagnostics) => Some(diagnostics),
            _ => None,
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, CompileError::Internal(_))
    }
}

/// Result type for compilation
pub type CompileResult<T> = Result<T, CompileError>;
