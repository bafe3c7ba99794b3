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

//! Function catalog
//!
//! Maps `(name, arity)` to an executable descriptor. A variadic entry always
//! wins over a fixed-arity entry of the same name.

use mapcalc_common::math;
use rand::rngs::StdRng;
use std::collections::BTreeMap;
use std::fmt;

/// Number of arguments a function accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Arity {
    Fixed(usize),
    Variadic,
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Fixed(n) => write!(f, "{n}"),
            Arity::Variadic => write!(f, "..."),
        }
    }
}

/// Pixel-position query answered by the runtime instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionQuery {
    X,
    Y,
    Width,
    Height,
    MinX,
    MinY,
    MaxX,
    MaxY,
}

/// Executable behavior of a catalog entry
#[derive(Clone, Copy)]
pub enum FunctionKind {
    Unary(fn(f64) -> f64),
    Binary(fn(f64, f64) -> f64),
    /// Arguments are collected into one slice
    Variadic(fn(&[f64]) -> f64),
    Position(PositionQuery),
    /// Draws from the runtime instance's random stream
    Random(fn(&mut StdRng, f64) -> f64),
}

impl fmt::Debug for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionKind::Unary(_) => write!(f, "Unary"),
            FunctionKind::Binary(_) => write!(f, "Binary"),
            FunctionKind::Variadic(_) => write!(f, "Variadic"),
            FunctionKind::Position(query) => write!(f, "Position({query:?})"),
            FunctionKind::Random(_) => write!(f, "Random"),
        }
    }
}

/// A resolved catalog entry
#[derive(Debug, Clone, Copy)]
pub struct FunctionDescriptor {
    pub name: &'static str,
    pub arity: Arity,
    pub kind: FunctionKind,
    /// Result may differ between calls with equal arguments
    pub volatile: bool,
}

impl PartialEq for FunctionDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.arity == other.arity
    }
}

/// Target of the `^` operator
pub const POW: FunctionDescriptor = FunctionDescriptor {
    name: "pow",
    arity: Arity::Fixed(2),
    kind: FunctionKind::Binary(math::pow),
    volatile: false,
};

impl FunctionDescriptor {
    /// Evaluate a call that needs no runtime state; `None` for position and random functions
    pub fn call_pure(&self, args: &[f64]) -> Option<f64> {
        match (self.kind, args) {
            (FunctionKind::Unary(f), [a]) => Some(f(*a)),
            (FunctionKind::Binary(f), [a, b]) => Some(f(*a, *b)),
            (FunctionKind::Variadic(f), args) => Some(f(args)),
            _ => None,
        }
    }

    /// Whether the result depends on the pixel being evaluated
    pub fn is_position_dependent(&self) -> bool {
        matches!(self.kind, FunctionKind::Position(_))
    }

    /// Whether calls with constant arguments may be evaluated at compile time
    pub fn is_foldable(&self) -> bool {
        !self.volatile && !matches!(self.kind, FunctionKind::Position(_) | FunctionKind::Random(_))
    }
}

/// Immutable registry of script functions
#[derive(Debug, Clone, Default)]
pub struct FunctionCatalog {
    entries: BTreeMap<(&'static str, Arity), FunctionDescriptor>,
}

impl FunctionCatalog {
    /// An empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entry, replacing any previous one with the same name and arity
    pub fn register(mut self, name: &'static str, arity: Arity, kind: FunctionKind, volatile: bool) -> Self {
        self.entries.insert((name, arity), FunctionDescriptor { name, arity, kind, volatile });
        self
    }

    fn unary(self, name: &'static str, f: fn(f64) -> f64) -> Self {
        self.register(name, Arity::Fixed(1), FunctionKind::Unary(f), false)
    }

    fn binary(self, name: &'static str, f: fn(f64, f64) -> f64) -> Self {
        self.register(name, Arity::Fixed(2), FunctionKind::Binary(f), false)
    }

    fn variadic(self, name: &'static str, f: fn(&[f64]) -> f64) -> Self {
        self.register(name, Arity::Variadic, FunctionKind::Variadic(f), false)
    }

    fn position(self, name: &'static str, query: PositionQuery) -> Self {
        self.register(name, Arity::Fixed(0), FunctionKind::Position(query), false)
    }

    fn random(self, name: &'static str, f: fn(&mut StdRng, f64) -> f64) -> Self {
        self.register(name, Arity::Fixed(1), FunctionKind::Random(f), true)
    }

    /// The standard script library
    pub fn standard() -> Self {
        Self::new()
            .unary("abs", f64::abs)
            .unary("acos", f64::acos)
            .unary("asin", f64::asin)
            .unary("atan", f64::atan)
            .binary("atan2", math::atan2)
            .unary("ceil", f64::ceil)
            .unary("cos", f64::cos)
            .unary("degToRad", math::deg_to_rad)
            .unary("exp", f64::exp)
            .unary("floor", f64::floor)
            .binary("hypot", math::hypot)
            .unary("isinf", math::is_inf)
            .unary("isnan", math::is_nan)
            .unary("isnull", math::is_nan)
            .unary("log", f64::ln)
            .binary("log", math::log_base)
            .unary("radToDeg", math::rad_to_deg)
            .unary("round", f64::round)
            .binary("round", math::round_to)
            .unary("sign", math::sign_value)
            .unary("sin", f64::sin)
            .unary("sqrt", f64::sqrt)
            .unary("tan", f64::tan)
            .binary("max", math::max2)
            .binary("min", math::min2)
            .variadic("max", math::max)
            .variadic("min", math::min)
            .variadic("mean", math::mean)
            .variadic("median", math::median)
            .variadic("mode", math::mode)
            .variadic("range", math::range)
            .variadic("sdev", math::sdev)
            .variadic("sum", math::sum)
            .variadic("variance", math::variance)
            .position("x", PositionQuery::X)
            .position("y", PositionQuery::Y)
            .position("width", PositionQuery::Width)
            .position("height", PositionQuery::Height)
            .position("xmin", PositionQuery::MinX)
            .position("ymin", PositionQuery::MinY)
            .position("xmax", PositionQuery::MaxX)
            .position("ymax", PositionQuery::MaxY)
            .random("rand", math::rand)
            .random("randInt", math::rand_int)
    }

    /// Resolve a call: variadic entries first, then an exact arity match
    pub fn resolve(&self, name: &str, arg_count: usize) -> Option<FunctionDescriptor> {
        self.lookup(name, Arity::Variadic).or_else(|| self.lookup(name, Arity::Fixed(arg_count)))
    }

    fn lookup(&self, name: &str, arity: Arity) -> Option<FunctionDescriptor> {
        self.entries.iter().find(|((n, a), _)| *n == name && *a == arity).map(|(_, d)| *d)
    }

    /// Whether any entry with this name is volatile
    pub fn is_volatile(&self, name: &str) -> bool {
        self.entries.values().any(|d| d.name == name && d.volatile)
    }

    /// Whether any entry with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.entries.keys().any(|(n, _)| *n == name)
    }

    /// Arities registered under `name`
    pub fn arities(&self, name: &str) -> Vec<Arity> {
        self.entries.keys().filter(|(n, _)| *n == name).map(|(_, a)| *a).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fixed_arity_resolution() {
        let catalog = FunctionCatalog::standard();
        assert_eq!(catalog.resolve("log", 1).map(|d| d.arity), Some(Arity::Fixed(1)));
        assert_eq!(catalog.resolve("log", 2).map(|d| d.arity), Some(Arity::Fixed(2)));
        assert!(catalog.resolve("log", 3).is_none());
        assert!(catalog.resolve("nosuch", 1).is_none());
    }

    #[test]
    fn test_variadic_shadows_fixed() {
        let catalog = FunctionCatalog::standard();
        let max = catalog.resolve("max", 2).unwrap();
        assert_eq!(max.arity, Arity::Variadic);
        let FunctionKind::Variadic(f) = max.kind else { panic!("expected variadic kind") };
        assert_eq!(f(&[1.0, f64::NAN, 3.0]), 3.0);
    }

    #[test]
    fn test_volatility() {
        let catalog = FunctionCatalog::standard();
        assert!(catalog.is_volatile("rand"));
        assert!(catalog.is_volatile("randInt"));
        assert!(!catalog.is_volatile("sin"));
        assert!(!catalog.resolve("x", 0).unwrap().is_foldable());
        assert!(catalog.resolve("sqrt", 1).unwrap().is_foldable());
    }

    proptest! {
        #[test]
        fn variadic_entries_never_fall_through(argc in 0usize..8, name_idx in 0usize..3) {
            let name = ["max", "min", "lookup"][name_idx];
            let catalog = FunctionCatalog::standard()
                .register("lookup", Arity::Fixed(argc), FunctionKind::Unary(f64::abs), false)
                .register("lookup", Arity::Variadic, FunctionKind::Variadic(math::sum), false);
            let resolved = catalog.resolve(name, argc).unwrap();
            prop_assert_eq!(resolved.arity, Arity::Variadic);
        }
    }
}
