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

//! Program assembly
//!
//! Turns an analyzed script into a [`GeneratedProgram`]: a set of sections
//! (declarations, defaults, image-scope initializer, per-pixel body, variable
//! accessor, option initializer), each produced by its own generator and run
//! in dependency order by the [`AssemblyPipeline`].

pub mod assembler;
pub mod config;
pub mod context;
pub mod error;
pub mod folding;
pub mod ir;
pub mod listing;
pub mod pipeline;
pub mod program;
pub mod sections;
pub mod translate;

pub use assembler::ProgramAssembler;
pub use config::CompilerConfig;
pub use context::AssemblyContext;
pub use error::{AssemblyError, AssemblyResult};
pub use ir::EvaluationModel;
pub use pipeline::AssemblyPipeline;
pub use program::{AccessorBranch, Declarations, GeneratedProgram, ImageVarInit, OptionInit, Section, SectionKind};
