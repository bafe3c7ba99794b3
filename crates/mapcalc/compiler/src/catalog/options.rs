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

//! Option catalog
//!
//! Script options are set in an `options { name = value; }` block. Each option
//! accepts literals from a union of value domains and maps the literal onto a
//! runtime setting; options left unset contribute their inactive setting.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::BitOr;

/// Literal written as an option value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OptionLiteral {
    /// The `null` keyword, in any letter case
    Null,
    Number(f64),
    /// Any other word
    Text(String),
}

impl OptionLiteral {
    /// Classify a word token
    pub fn classify(word: &str) -> Self {
        if word.eq_ignore_ascii_case("null") {
            OptionLiteral::Null
        } else if let Ok(n) = word.parse::<f64>() {
            OptionLiteral::Number(n)
        } else {
            OptionLiteral::Text(word.to_string())
        }
    }
}

impl fmt::Display for OptionLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionLiteral::Null => write!(f, "null"),
            OptionLiteral::Number(n) => write!(f, "{n}"),
            OptionLiteral::Text(text) => write!(f, "{text}"),
        }
    }
}

/// Union of accepted literal kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValueDomain {
    pub null: bool,
    pub numeric: bool,
    pub text: bool,
}

impl ValueDomain {
    pub const NULL: ValueDomain = ValueDomain { null: true, numeric: false, text: false };
    pub const NUMERIC: ValueDomain = ValueDomain { null: false, numeric: true, text: false };
    pub const TEXT: ValueDomain = ValueDomain { null: false, numeric: false, text: true };

    pub fn accepts(&self, literal: &OptionLiteral) -> bool {
        match literal {
            OptionLiteral::Null => self.null,
            OptionLiteral::Number(_) => self.numeric,
            OptionLiteral::Text(_) => self.text,
        }
    }
}

impl BitOr for ValueDomain {
    type Output = ValueDomain;

    fn bitor(self, rhs: Self) -> Self::Output {
        ValueDomain {
            null: self.null || rhs.null,
            numeric: self.numeric || rhs.numeric,
            text: self.text || rhs.text,
        }
    }
}

/// Behavior of a source read that falls outside the image
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OutsidePolicy {
    /// Fail with an out-of-bounds runtime error
    Fail,
    /// Substitute this value (NaN for `null`)
    Value(f64),
}

/// Runtime effect of an option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OptionSetting {
    Outside(OutsidePolicy),
}

/// A catalog entry
#[derive(Debug, Clone, Copy)]
pub struct OptionDescriptor {
    pub name: &'static str,
    pub domain: ValueDomain,
    /// Setting emitted when the script sets the option; only called with accepted literals
    pub activate: fn(&OptionLiteral) -> OptionSetting,
    /// Setting emitted when the script leaves the option alone
    pub inactive: fn() -> OptionSetting,
}

fn outside_active(literal: &OptionLiteral) -> OptionSetting {
    match literal {
        OptionLiteral::Number(n) => OptionSetting::Outside(OutsidePolicy::Value(*n)),
        _ => OptionSetting::Outside(OutsidePolicy::Value(f64::NAN)),
    }
}

fn outside_inactive() -> OptionSetting {
    OptionSetting::Outside(OutsidePolicy::Fail)
}

/// Immutable registry of script options, keyed by lower-cased name
#[derive(Debug, Clone, Default)]
pub struct OptionCatalog {
    entries: BTreeMap<String, OptionDescriptor>,
}

impl OptionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, descriptor: OptionDescriptor) -> Self {
        self.entries.insert(descriptor.name.to_ascii_lowercase(), descriptor);
        self
    }

    /// The options understood by every script
    pub fn standard() -> Self {
        Self::new().register(OptionDescriptor {
            name: "outside",
            domain: ValueDomain::NULL | ValueDomain::NUMERIC,
            activate: outside_active,
            inactive: outside_inactive,
        })
    }

    /// Look up an option, ignoring letter case
    pub fn resolve_option(&self, name: &str) -> Option<&OptionDescriptor> {
        self.entries.get(&name.to_ascii_lowercase())
    }

    pub fn domain_accepts(&self, descriptor: &OptionDescriptor, literal: &OptionLiteral) -> bool {
        descriptor.domain.accepts(literal)
    }

    /// All options in name order
    pub fn descriptors(&self) -> impl Iterator<Item = &OptionDescriptor> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(OptionLiteral::classify("NULL"), OptionLiteral::Null);
        assert_eq!(OptionLiteral::classify("2.5"), OptionLiteral::Number(2.5));
        assert_eq!(OptionLiteral::classify("wrap"), OptionLiteral::Text("wrap".into()));
    }

    #[test]
    fn test_outside_option() {
        let catalog = OptionCatalog::standard();
        let outside = catalog.resolve_option("OutSide").unwrap();
        assert!(catalog.domain_accepts(outside, &OptionLiteral::Null));
        assert!(catalog.domain_accepts(outside, &OptionLiteral::Number(0.0)));
        assert!(!catalog.domain_accepts(outside, &OptionLiteral::Text("wrap".into())));

        assert_eq!((outside.activate)(&OptionLiteral::Number(0.0)), OptionSetting::Outside(OutsidePolicy::Value(0.0)));
        assert!(matches!((outside.activate)(&OptionLiteral::Null), OptionSetting::Outside(OutsidePolicy::Value(v)) if v.is_nan()));
        assert_eq!((outside.inactive)(), OptionSetting::Outside(OutsidePolicy::Fail));
        assert!(catalog.resolve_option("nosuch").is_none());
    }

    #[test]
    fn test_domain_union() {
        let domain = ValueDomain::NULL | ValueDomain::TEXT;
        assert!(domain.accepts(&OptionLiteral::Null));
        assert!(domain.accepts(&OptionLiteral::Text("x".into())));
        assert!(!domain.accepts(&OptionLiteral::Number(1.0)));
    }
}
