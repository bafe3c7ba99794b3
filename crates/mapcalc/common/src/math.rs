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

//! Numeric kernel shared by the compiler and the runtime
//!
//! NaN plays the role of "null" in scripts. Comparison and boolean helpers are
//! three-valued: any NaN operand yields NaN, otherwise the result is exactly
//! `0.0` or `1.0`. Native `f64` comparisons would silently turn NaN into
//! `false`, which is why scripts never use them directly.

use rand::Rng;
use rand::rngs::StdRng;

/// Truthiness of a value: `None` for NaN, otherwise -1, 0 or 1
pub fn sign(x: f64) -> Option<i8> {
    if x.is_nan() {
        None
    } else if x > 0.0 {
        Some(1)
    } else if x < 0.0 {
        Some(-1)
    } else {
        Some(0)
    }
}

/// Script-visible `sign`: NaN maps to NaN
pub fn sign_value(x: f64) -> f64 {
    match sign(x) {
        Some(s) => s as f64,
        None => f64::NAN,
    }
}

fn flag(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

fn binary_logic(x: f64, y: f64, op: impl FnOnce(f64, f64) -> bool) -> f64 {
    if x.is_nan() || y.is_nan() { f64::NAN } else { flag(op(x, y)) }
}

pub fn and(x: f64, y: f64) -> f64 {
    binary_logic(x, y, |a, b| a != 0.0 && b != 0.0)
}

pub fn or(x: f64, y: f64) -> f64 {
    binary_logic(x, y, |a, b| a != 0.0 || b != 0.0)
}

pub fn xor(x: f64, y: f64) -> f64 {
    binary_logic(x, y, |a, b| (a != 0.0) ^ (b != 0.0))
}

pub fn not(x: f64) -> f64 {
    if x.is_nan() { f64::NAN } else { flag(x == 0.0) }
}

pub fn gt(x: f64, y: f64) -> f64 {
    binary_logic(x, y, |a, b| a > b)
}

pub fn ge(x: f64, y: f64) -> f64 {
    binary_logic(x, y, |a, b| a >= b)
}

pub fn lt(x: f64, y: f64) -> f64 {
    binary_logic(x, y, |a, b| a < b)
}

pub fn le(x: f64, y: f64) -> f64 {
    binary_logic(x, y, |a, b| a <= b)
}

pub fn eq(x: f64, y: f64) -> f64 {
    binary_logic(x, y, |a, b| a == b)
}

pub fn ne(x: f64, y: f64) -> f64 {
    binary_logic(x, y, |a, b| a != b)
}

pub fn pow(x: f64, y: f64) -> f64 {
    x.powf(y)
}

pub fn deg_to_rad(x: f64) -> f64 {
    x.to_radians()
}

pub fn rad_to_deg(x: f64) -> f64 {
    x.to_degrees()
}

pub fn is_nan(x: f64) -> f64 {
    flag(x.is_nan())
}

pub fn is_inf(x: f64) -> f64 {
    if x.is_nan() { f64::NAN } else { flag(x.is_infinite()) }
}

pub fn log_base(x: f64, base: f64) -> f64 {
    x.ln() / base.ln()
}

/// Round to the nearest multiple of `precision`
pub fn round_to(x: f64, precision: f64) -> f64 {
    if precision == 0.0 || precision.is_nan() {
        return f64::NAN;
    }
    (x / precision).round() * precision
}

pub fn hypot(x: f64, y: f64) -> f64 {
    x.hypot(y)
}

pub fn atan2(y: f64, x: f64) -> f64 {
    y.atan2(x)
}

pub fn max2(x: f64, y: f64) -> f64 {
    if x.is_nan() || y.is_nan() { f64::NAN } else { x.max(y) }
}

pub fn min2(x: f64, y: f64) -> f64 {
    if x.is_nan() || y.is_nan() { f64::NAN } else { x.min(y) }
}

// Statistics ignore NaN entries and return NaN when nothing is left.

fn valid(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| !v.is_nan()).collect()
}

pub fn max(values: &[f64]) -> f64 {
    valid(values).into_iter().reduce(f64::max).unwrap_or(f64::NAN)
}

pub fn min(values: &[f64]) -> f64 {
    valid(values).into_iter().reduce(f64::min).unwrap_or(f64::NAN)
}

pub fn sum(values: &[f64]) -> f64 {
    let values = valid(values);
    if values.is_empty() { f64::NAN } else { values.iter().sum() }
}

pub fn mean(values: &[f64]) -> f64 {
    let values = valid(values);
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn median(values: &[f64]) -> f64 {
    let mut values = valid(values);
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 { (values[mid - 1] + values[mid]) / 2.0 } else { values[mid] }
}

/// Most frequent value; ties resolve to the smallest candidate
pub fn mode(values: &[f64]) -> f64 {
    let mut values = valid(values);
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_by(f64::total_cmp);
    let (mut best, mut best_count) = (values[0], 0usize);
    let mut i = 0;
    while i < values.len() {
        let run = values[i..].iter().take_while(|v| **v == values[i]).count();
        if run > best_count {
            best = values[i];
            best_count = run;
        }
        i += run;
    }
    best
}

pub fn range(values: &[f64]) -> f64 {
    max(values) - min(values)
}

/// Sample variance (n - 1 denominator)
pub fn variance(values: &[f64]) -> f64 {
    let values = valid(values);
    if values.len() < 2 {
        return f64::NAN;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

pub fn sdev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Uniform value in `[0, upper)`
pub fn rand(rng: &mut StdRng, upper: f64) -> f64 {
    if upper.is_nan() {
        return f64::NAN;
    }
    rng.r#gen::<f64>() * upper
}

/// Uniform integer in `[0, upper)`
pub fn rand_int(rng: &mut StdRng, upper: f64) -> f64 {
    rand(rng, upper).floor()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn native(b: bool) -> f64 {
        if b { 1.0 } else { 0.0 }
    }

    proptest! {
        #[test]
        fn logic_matches_native_for_non_nan(x in -1e6f64..1e6, y in -1e6f64..1e6) {
            prop_assert_eq!(and(x, y), native(x != 0.0 && y != 0.0));
            prop_assert_eq!(or(x, y), native(x != 0.0 || y != 0.0));
            prop_assert_eq!(xor(x, y), native((x != 0.0) != (y != 0.0)));
            prop_assert_eq!(gt(x, y), native(x > y));
            prop_assert_eq!(ge(x, y), native(x >= y));
            prop_assert_eq!(lt(x, y), native(x < y));
            prop_assert_eq!(le(x, y), native(x <= y));
            prop_assert_eq!(eq(x, y), native(x == y));
            prop_assert_eq!(ne(x, y), native(x != y));
            prop_assert_eq!(not(x), native(x == 0.0));
        }

        #[test]
        fn logic_propagates_nan(x in -1e6f64..1e6, nan_first in any::<bool>()) {
            let (a, b) = if nan_first { (f64::NAN, x) } else { (x, f64::NAN) };
            for op in [and, or, xor, gt, ge, lt, le, eq, ne] {
                prop_assert!(op(a, b).is_nan());
            }
            prop_assert!(not(f64::NAN).is_nan());
        }
    }

    #[test]
    fn test_sign() {
        assert_eq!(sign(3.5), Some(1));
        assert_eq!(sign(-0.1), Some(-1));
        assert_eq!(sign(0.0), Some(0));
        assert_eq!(sign(-0.0), Some(0));
        assert_eq!(sign(f64::NAN), None);
        assert!(sign_value(f64::NAN).is_nan());
    }

    #[test]
    fn test_statistics_skip_nan() {
        let values = [3.0, f64::NAN, 1.0, 2.0, 2.0];
        assert_eq!(max(&values), 3.0);
        assert_eq!(min(&values), 1.0);
        assert_eq!(sum(&values), 8.0);
        assert_eq!(mean(&values), 2.0);
        assert_eq!(median(&values), 2.0);
        assert_eq!(mode(&values), 2.0);
        assert_eq!(range(&values), 2.0);
        assert!((variance(&values) - 2.0 / 3.0).abs() < 1e-12);
        assert!(max(&[f64::NAN]).is_nan());
        assert!(variance(&[1.0]).is_nan());
    }

    #[test]
    fn test_median_even_count() {
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_round_to_precision() {
        assert!((round_to(3.14159, 0.01) - 3.14).abs() < 1e-12);
        assert_eq!(round_to(17.0, 5.0), 15.0);
        assert!(round_to(1.0, 0.0).is_nan());
    }

    #[test]
    fn test_random_is_reproducible_for_a_seed() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        for _ in 0..16 {
            let v = rand(&mut a, 10.0);
            assert!((0.0..10.0).contains(&v));
            assert_eq!(v, rand(&mut b, 10.0));
        }
        let i = rand_int(&mut a, 5.0);
        assert_eq!(i, i.floor());
    }
}
