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

//! Image-scope and option initializer sections

use super::traits::SectionGenerator;
use crate::ast::Binding;
use crate::codegen::context::AssemblyContext;
use crate::codegen::error::{AssemblyError, AssemblyResult};
use crate::codegen::folding::fold_expr;
use crate::codegen::program::{ImageVarInit, OptionInit, Section, SectionKind};

/// Initializer run once when the processing bounds are fixed
pub struct ImageInitGenerator;

impl SectionGenerator for ImageInitGenerator {
    fn generate(&self, context: &mut AssemblyContext<'_>) -> AssemblyResult<Section> {
        let declared = context.declarations()?.image_vars.len();
        let mut inits = Vec::new();
        for decl in &context.analyzed.script.init {
            let Some(Binding::ImageVar(slot)) = decl.name.binding else {
                return Err(AssemblyError::Internal(format!("init variable '{}' was not bound by analysis", decl.name.name)));
            };
            if slot >= declared {
                return Err(AssemblyError::Internal(format!("init variable '{}' has undeclared slot {slot}", decl.name.name)));
            }
            let Some(value) = &decl.value else {
                continue;
            };
            let mut value = context.translate_expr(value)?;
            if context.config.enable_constant_folding {
                value = fold_expr(value);
            }
            inits.push(ImageVarInit { slot, value });
        }
        Ok(Section::ImageInit(inits))
    }

    fn section_kind(&self) -> SectionKind {
        SectionKind::ImageInit
    }

    fn dependencies(&self) -> &'static [SectionKind] {
        &[SectionKind::Declarations]
    }
}

/// One setting per catalog option, active if the script set it
pub struct OptionInitGenerator;

impl SectionGenerator for OptionInitGenerator {
    fn generate(&self, context: &mut AssemblyContext<'_>) -> AssemblyResult<Section> {
        let entries = &context.analyzed.script.options;
        let mut inits = Vec::new();
        for descriptor in context.options.descriptors() {
            let entry = entries.iter().rev().find(|entry| entry.name.eq_ignore_ascii_case(descriptor.name));
            let init = match entry {
                Some(entry) => {
                    if !context.options.domain_accepts(descriptor, &entry.value) {
                        return Err(AssemblyError::Internal(format!("option '{}' reached assembly with value '{}'", entry.name, entry.value)));
                    }
                    OptionInit {
                        name: descriptor.name,
                        setting: (descriptor.activate)(&entry.value),
                        active: true,
                    }
                }
                None => OptionInit {
                    name: descriptor.name,
                    setting: (descriptor.inactive)(),
                    active: false,
                },
            };
            inits.push(init);
        }
        Ok(Section::OptionInit(inits))
    }

    fn section_kind(&self) -> SectionKind {
        SectionKind::OptionInit
    }

    fn dependencies(&self) -> &'static [SectionKind] {
        &[SectionKind::Declarations, SectionKind::Defaults, SectionKind::ImageInit, SectionKind::Body, SectionKind::Accessor]
    }
}
