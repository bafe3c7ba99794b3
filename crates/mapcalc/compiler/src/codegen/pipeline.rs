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

//! Pipeline orchestration for section generation

use super::context::AssemblyContext;
use super::error::{AssemblyError, AssemblyResult};
use super::program::{Section, SectionKind};
use super::sections::SectionGenerator;
use std::collections::{BTreeMap, VecDeque};
use tracing::trace;

/// Pipeline running section generators in dependency order
#[derive(Debug, Default)]
pub struct AssemblyPipeline;

impl AssemblyPipeline {
    pub fn new() -> Self {
        AssemblyPipeline
    }

    /// Run all section generators in dependency order.
    ///
    /// Sections come back in generation order. Ties between independent
    /// sections break by [`SectionKind`] order, so the result is deterministic.
    pub fn run(&self, generators: Vec<Box<dyn SectionGenerator>>, context: &mut AssemblyContext<'_>) -> AssemblyResult<Vec<Section>> {
        let mut by_kind: BTreeMap<SectionKind, Box<dyn SectionGenerator>> = BTreeMap::new();
        for generator in generators {
            let kind = generator.section_kind();
            if by_kind.contains_key(&kind) {
                return Err(AssemblyError::Configuration(format!("Duplicate generator for section {kind:?}")));
            }
            by_kind.insert(kind, generator);
        }

        let mut in_degree: BTreeMap<SectionKind, usize> = by_kind.keys().map(|kind| (*kind, 0)).collect();
        let mut dependents: BTreeMap<SectionKind, Vec<SectionKind>> = by_kind.keys().map(|kind| (*kind, Vec::new())).collect();
        for (kind, generator) in &by_kind {
            for dep in generator.dependencies() {
                let Some(list) = dependents.get_mut(dep) else {
                    return Err(AssemblyError::Configuration(format!("Missing generator for dependency section {dep:?}")));
                };
                list.push(*kind);
                *in_degree.entry(*kind).or_default() += 1;
            }
        }

        // Kahn's algorithm
        let mut queue: VecDeque<SectionKind> = in_degree.iter().filter(|(_, deg)| **deg == 0).map(|(kind, _)| *kind).collect();
        let mut order = Vec::with_capacity(by_kind.len());
        while let Some(kind) = queue.pop_front() {
            order.push(kind);
            for next in dependents.get(&kind).map(Vec::as_slice).unwrap_or_default() {
                if let Some(deg) = in_degree.get_mut(next) {
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(*next);
                    }
                }
            }
        }
        if order.len() != by_kind.len() {
            return Err(AssemblyError::Configuration("Section dependency cycle detected".into()));
        }

        let mut sections = Vec::with_capacity(order.len());
        for kind in order {
            let Some(generator) = by_kind.remove(&kind) else {
                return Err(AssemblyError::Internal(format!("generator for {kind:?} vanished")));
            };
            trace!(section = ?kind, "generating section");
            let section = generator.generate(context)?;
            if section.kind() != kind {
                return Err(AssemblyError::Internal(format!("generator for {kind:?} produced a {:?} section", section.kind())));
            }
            sections.push(section);
        }
        Ok(sections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalyzedScript;
    use crate::analysis::Diagnostics;
    use crate::ast::Script;
    use crate::catalog::OptionCatalog;
    use crate::codegen::config::CompilerConfig;
    use crate::codegen::sections::standard_generators;

    struct Fixed(SectionKind, &'static [SectionKind]);

    impl SectionGenerator for Fixed {
        fn generate(&self, _context: &mut AssemblyContext<'_>) -> AssemblyResult<Section> {
            Ok(Section::Defaults(Vec::new()))
        }

        fn section_kind(&self) -> SectionKind {
            self.0
        }

        fn dependencies(&self) -> &'static [SectionKind] {
            self.1
        }
    }

    fn empty_script() -> AnalyzedScript {
        AnalyzedScript {
            script: Script::default(),
            sources: Vec::new(),
            destinations: vec!["dest".into()],
            image_vars: Vec::new(),
            local_count: 0,
            warnings: Diagnostics::new(),
        }
    }

    #[test]
    fn test_option_init_runs_last() {
        let analyzed = empty_script();
        let config = CompilerConfig::default();
        let options = OptionCatalog::standard();
        let mut context = AssemblyContext::new(&analyzed, &config, &options).unwrap();
        let sections = AssemblyPipeline::new().run(standard_generators(), &mut context).unwrap();
        let kinds: Vec<_> = sections.iter().map(Section::kind).collect();
        assert_eq!(kinds.first(), Some(&SectionKind::Declarations));
        assert_eq!(kinds.last(), Some(&SectionKind::OptionInit));
        assert_eq!(kinds.len(), 6);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let analyzed = empty_script();
        let config = CompilerConfig::default();
        let options = OptionCatalog::standard();
        let mut context = AssemblyContext::new(&analyzed, &config, &options).unwrap();
        let generators: Vec<Box<dyn SectionGenerator>> = vec![
            Box::new(Fixed(SectionKind::Defaults, &[SectionKind::Accessor])),
            Box::new(Fixed(SectionKind::Accessor, &[SectionKind::Defaults])),
        ];
        let err = AssemblyPipeline::new().run(generators, &mut context).unwrap_err();
        assert!(matches!(err, AssemblyError::Configuration(_)));
    }

    #[test]
    fn test_missing_dependency_is_rejected() {
        let analyzed = empty_script();
        let config = CompilerConfig::default();
        let options = OptionCatalog::standard();
        let mut context = AssemblyContext::new(&analyzed, &config, &options).unwrap();
        let generators: Vec<Box<dyn SectionGenerator>> = vec![Box::new(Fixed(SectionKind::Defaults, &[SectionKind::Declarations]))];
        assert!(AssemblyPipeline::new().run(generators, &mut context).is_err());
    }
}
