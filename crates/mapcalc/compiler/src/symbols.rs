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

//! Symbol table used during semantic analysis
//!
//! A [`ScopeStack`] holds one [`Scope`] per lexical level. Lookups walk from
//! the innermost level outward so inner declarations shadow outer ones, and
//! dropping a level makes the outer declarations visible again.

use thiserror::Error;

/// Classification of a declared name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// Declared in `init`; lives for the whole run
    ImageScopeVar,
    /// Assigned in the body; recomputed for every pixel
    PixelScopeVar,
    /// `foreach` loop variable
    LoopVar,
}

impl SymbolKind {
    /// Whether a symbol of this kind satisfies a query for `wanted`.
    /// Loop variables are pixel-scope variables.
    pub fn matches(self, wanted: SymbolKind) -> bool {
        self == wanted || (self == SymbolKind::LoopVar && wanted == SymbolKind::PixelScopeVar)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Label of the scope the symbol was declared in
    pub scope: String,
    /// Storage slot assigned by the analyzer
    pub slot: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub label: String,
    symbols: Vec<Symbol>,
}

impl Scope {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            symbols: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.name == name)
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    #[error("cannot add symbol '{0}': no scope level has been opened")]
    NoScope(String),

    #[error("symbol '{name}' is already declared in scope '{scope}'")]
    Duplicate { name: String, scope: String },
}

pub type SymbolResult<T> = Result<T, SymbolError>;

/// Stack of lexical scopes
#[derive(Debug, Clone, Default)]
pub struct ScopeStack {
    levels: Vec<Scope>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new innermost level
    pub fn add_level(&mut self, label: impl Into<String>) {
        self.levels.push(Scope::new(label));
    }

    /// Close the innermost level, returning it
    pub fn drop_level(&mut self) -> Option<Scope> {
        self.levels.pop()
    }

    /// Declare a symbol in the innermost level
    pub fn add_symbol(&mut self, name: impl Into<String>, kind: SymbolKind, slot: usize) -> SymbolResult<&Symbol> {
        let name = name.into();
        let Some(scope) = self.levels.last_mut() else {
            return Err(SymbolError::NoScope(name));
        };
        if scope.get(&name).is_some() {
            return Err(SymbolError::Duplicate { name, scope: scope.label.clone() });
        }
        scope.symbols.push(Symbol {
            name,
            kind,
            scope: scope.label.clone(),
            slot,
        });
        Ok(&scope.symbols[scope.symbols.len() - 1])
    }

    /// Innermost visible declaration of `name`
    pub fn find(&self, name: &str) -> Option<&Symbol> {
        self.levels.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Innermost visible declaration of `name` matching `kind`
    pub fn find_kind(&self, name: &str, kind: SymbolKind) -> Option<&Symbol> {
        self.find(name).filter(|s| s.kind.matches(kind))
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_add_before_level_fails() {
        let mut stack = ScopeStack::new();
        assert_eq!(stack.add_symbol("a", SymbolKind::PixelScopeVar, 0).unwrap_err(), SymbolError::NoScope("a".into()));
    }

    #[test]
    fn test_duplicate_in_same_level() {
        let mut stack = ScopeStack::new();
        stack.add_level("body");
        stack.add_symbol("a", SymbolKind::PixelScopeVar, 0).unwrap();
        assert!(matches!(stack.add_symbol("a", SymbolKind::PixelScopeVar, 1), Err(SymbolError::Duplicate { .. })));
    }

    #[test]
    fn test_loop_var_matches_pixel_scope() {
        let mut stack = ScopeStack::new();
        stack.add_level("foreach");
        stack.add_symbol("i", SymbolKind::LoopVar, 0).unwrap();
        assert!(stack.find_kind("i", SymbolKind::PixelScopeVar).is_some());
        assert!(stack.find_kind("i", SymbolKind::ImageScopeVar).is_none());
        assert!(!SymbolKind::PixelScopeVar.matches(SymbolKind::LoopVar));
    }

    proptest! {
        #[test]
        fn innermost_declaration_wins(depth in 1usize..8, name in "[a-z]{1,6}") {
            let mut stack = ScopeStack::new();
            for level in 0..depth {
                stack.add_level(format!("level{level}"));
                stack.add_symbol(name.clone(), SymbolKind::PixelScopeVar, level).unwrap();
            }
            for level in (0..depth).rev() {
                prop_assert_eq!(stack.find(&name).map(|s| s.slot), Some(level));
                prop_assert_eq!(stack.depth(), level + 1);
                stack.drop_level();
            }
            prop_assert!(!stack.is_defined(&name));
        }
    }
}
