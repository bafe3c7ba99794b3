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

//! Declarations, defaults and accessor sections

use super::traits::SectionGenerator;
use crate::codegen::context::AssemblyContext;
use crate::codegen::error::AssemblyResult;
use crate::codegen::program::{AccessorBranch, Declarations, Section, SectionKind};

/// Image tables and image-scope variable declarations
pub struct DeclarationsGenerator;

impl SectionGenerator for DeclarationsGenerator {
    fn generate(&self, context: &mut AssemblyContext<'_>) -> AssemblyResult<Section> {
        let declarations = Declarations {
            sources: context.analyzed.sources.clone(),
            destinations: context.analyzed.destinations.clone(),
            image_vars: context.analyzed.image_vars.clone(),
        };
        context.set_declarations(declarations.clone());
        Ok(Section::Declarations(declarations))
    }

    fn section_kind(&self) -> SectionKind {
        SectionKind::Declarations
    }

    fn dependencies(&self) -> &'static [SectionKind] {
        &[]
    }
}

/// Values image-scope variables hold before initialization
pub struct DefaultsGenerator;

impl SectionGenerator for DefaultsGenerator {
    fn generate(&self, context: &mut AssemblyContext<'_>) -> AssemblyResult<Section> {
        let count = context.declarations()?.image_vars.len();
        Ok(Section::Defaults(vec![0.0; count]))
    }

    fn section_kind(&self) -> SectionKind {
        SectionKind::Defaults
    }

    fn dependencies(&self) -> &'static [SectionKind] {
        &[SectionKind::Declarations]
    }
}

/// Name-keyed access to image-scope variables
pub struct AccessorGenerator;

impl SectionGenerator for AccessorGenerator {
    fn generate(&self, context: &mut AssemblyContext<'_>) -> AssemblyResult<Section> {
        let branches = context
            .declarations()?
            .image_vars
            .iter()
            .enumerate()
            .map(|(slot, name)| AccessorBranch { name: name.clone(), slot })
            .collect();
        Ok(Section::Accessor(branches))
    }

    fn section_kind(&self) -> SectionKind {
        SectionKind::Accessor
    }

    fn dependencies(&self) -> &'static [SectionKind] {
        &[SectionKind::Declarations]
    }
}
