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

//! Map-algebra script compiler
//!
//! Scripts go through four stages: [`parser`] builds a syntax tree,
//! [`analysis`] binds and checks every name against the image roles,
//! [`codegen`] assembles a sectioned [`GeneratedProgram`], and a runtime
//! loader turns that program into something that evaluates pixels.

pub mod analysis;
pub mod ast;
pub mod catalog;
pub mod codegen;
pub mod compiler;
pub mod error;
pub mod parser;
pub mod symbols;

pub use analysis::{AnalyzedScript, Analyzer, Diagnostic, DiagnosticKind, Diagnostics, ImageRoles, Severity};
pub use ast::ImageRole;
pub use catalog::{FunctionCatalog, OptionCatalog};
pub use codegen::{CompilerConfig, EvaluationModel, GeneratedProgram};
pub use compiler::{CompiledProgram, Compiler};
pub use error::{CompileError, CompileResult};
pub use parser::{ParseError, parse};
