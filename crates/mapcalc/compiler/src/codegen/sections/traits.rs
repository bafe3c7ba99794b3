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

//! Section generator trait

use crate::codegen::context::AssemblyContext;
use crate::codegen::error::AssemblyResult;
use crate::codegen::program::{Section, SectionKind};

/// Trait for generating one section of a program
pub trait SectionGenerator {
    /// Produce the section given the assembly context
    fn generate(&self, context: &mut AssemblyContext<'_>) -> AssemblyResult<Section>;

    /// The kind of section this generator produces
    fn section_kind(&self) -> SectionKind;

    /// Other sections that must be generated first
    fn dependencies(&self) -> &'static [SectionKind];
}
