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

//! Named constants

use std::f64::consts;

/// Value of a named constant, if `name` is one
pub fn lookup(name: &str) -> Option<f64> {
    let value = match name {
        "M_PI" => consts::PI,
        "M_E" => consts::E,
        "M_PI_2" => consts::FRAC_PI_2,
        "M_PI_4" => consts::FRAC_PI_4,
        "M_SQRT2" => consts::SQRT_2,
        "NaN" | "NULL" => f64::NAN,
        "TRUE" => 1.0,
        "FALSE" => 0.0,
        _ => return None,
    };
    Some(value)
}

pub fn is_constant(name: &str) -> bool {
    lookup(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("M_PI"), Some(consts::PI));
        assert_eq!(lookup("TRUE"), Some(1.0));
        assert!(lookup("NULL").unwrap().is_nan());
        assert!(lookup("m_pi").is_none());
    }
}
