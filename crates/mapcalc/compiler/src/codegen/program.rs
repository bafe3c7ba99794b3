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

//! The generated program
//!
//! A [`GeneratedProgram`] is the product of assembly: one value per section,
//! immutable once built and shared behind an `Arc` by every runtime instance.

use super::ir::{EvaluationModel, Expr, Stmt};
use crate::catalog::options::{OptionSetting, OutsidePolicy};

/// Image tables and image-scope variable names
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Declarations {
    pub sources: Vec<String>,
    pub destinations: Vec<String>,
    /// Indexed by image-scope variable slot
    pub image_vars: Vec<String>,
}

/// Initializer of one image-scope variable
#[derive(Debug, Clone, PartialEq)]
pub struct ImageVarInit {
    pub slot: usize,
    pub value: Expr,
}

/// Setting contributed by one catalog option
#[derive(Debug, Clone, PartialEq)]
pub struct OptionInit {
    pub name: &'static str,
    pub setting: OptionSetting,
    /// Whether the script set the option explicitly
    pub active: bool,
}

/// One branch of the variable accessor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessorBranch {
    pub name: String,
    pub slot: usize,
}

/// Sections produced by the assembler, in the order they are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SectionKind {
    Declarations,
    Defaults,
    ImageInit,
    Body,
    Accessor,
    OptionInit,
}

/// Content of one generated section
#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    Declarations(Declarations),
    /// Value of every image-scope variable before its initializer runs
    Defaults(Vec<f64>),
    ImageInit(Vec<ImageVarInit>),
    Body(Vec<Stmt>),
    Accessor(Vec<AccessorBranch>),
    OptionInit(Vec<OptionInit>),
}

impl Section {
    pub fn kind(&self) -> SectionKind {
        match self {
            Section::Declarations(_) => SectionKind::Declarations,
            Section::Defaults(_) => SectionKind::Defaults,
            Section::ImageInit(_) => SectionKind::ImageInit,
            Section::Body(_) => SectionKind::Body,
            Section::Accessor(_) => SectionKind::Accessor,
            Section::OptionInit(_) => SectionKind::OptionInit,
        }
    }
}

/// Slot counts gathered during assembly
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotCounts {
    pub locals: usize,
    pub arrays: usize,
    /// Indirect model: local slot holding the returned value
    pub result: Option<usize>,
}

/// Executable per-pixel program
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedProgram {
    model: EvaluationModel,
    declarations: Declarations,
    defaults: Vec<f64>,
    image_init: Vec<ImageVarInit>,
    body: Vec<Stmt>,
    accessor: Vec<AccessorBranch>,
    option_init: Vec<OptionInit>,
    slots: SlotCounts,
}

impl GeneratedProgram {
    pub(crate) fn from_sections(model: EvaluationModel, sections: Vec<Section>, slots: SlotCounts) -> Option<Self> {
        let mut declarations = None;
        let mut defaults = None;
        let mut image_init = None;
        let mut body = None;
        let mut accessor = None;
        let mut option_init = None;
        for section in sections {
            match section {
                Section::Declarations(s) => declarations = Some(s),
                Section::Defaults(s) => defaults = Some(s),
                Section::ImageInit(s) => image_init = Some(s),
                Section::Body(s) => body = Some(s),
                Section::Accessor(s) => accessor = Some(s),
                Section::OptionInit(s) => option_init = Some(s),
            }
        }
        Some(Self {
            model,
            declarations: declarations?,
            defaults: defaults?,
            image_init: image_init?,
            body: body?,
            accessor: accessor?,
            option_init: option_init?,
            slots,
        })
    }

    pub fn model(&self) -> EvaluationModel {
        self.model
    }

    pub fn sources(&self) -> &[String] {
        &self.declarations.sources
    }

    pub fn destinations(&self) -> &[String] {
        &self.declarations.destinations
    }

    pub fn image_vars(&self) -> &[String] {
        &self.declarations.image_vars
    }

    pub fn declarations(&self) -> &Declarations {
        &self.declarations
    }

    pub fn defaults(&self) -> &[f64] {
        &self.defaults
    }

    pub fn image_init(&self) -> &[ImageVarInit] {
        &self.image_init
    }

    /// Initializer of one image-scope variable, if it has one
    pub fn initializer_for(&self, slot: usize) -> Option<&ImageVarInit> {
        self.image_init.iter().find(|init| init.slot == slot)
    }

    pub fn body(&self) -> &[Stmt] {
        &self.body
    }

    pub fn accessor(&self) -> &[AccessorBranch] {
        &self.accessor
    }

    /// Slot of the image-scope variable called `name`
    pub fn variable_slot(&self, name: &str) -> Option<usize> {
        self.accessor.iter().find(|branch| branch.name == name).map(|branch| branch.slot)
    }

    pub fn option_init(&self) -> &[OptionInit] {
        &self.option_init
    }

    /// Out-of-bounds read behavior chosen by the option initializer
    pub fn outside_policy(&self) -> OutsidePolicy {
        self.option_init
            .iter()
            .map(|init| match &init.setting {
                OptionSetting::Outside(policy) => *policy,
            })
            .next()
            .unwrap_or(OutsidePolicy::Fail)
    }

    pub fn source_index(&self, name: &str) -> Option<usize> {
        self.declarations.sources.iter().position(|n| n == name)
    }

    pub fn destination_index(&self, name: &str) -> Option<usize> {
        self.declarations.destinations.iter().position(|n| n == name)
    }

    pub fn local_count(&self) -> usize {
        self.slots.locals
    }

    pub fn image_var_count(&self) -> usize {
        self.declarations.image_vars.len()
    }

    pub fn array_count(&self) -> usize {
        self.slots.arrays
    }

    pub fn result_slot(&self) -> Option<usize> {
        self.slots.result
    }
}
