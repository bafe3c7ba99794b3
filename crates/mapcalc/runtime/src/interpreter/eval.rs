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

//! Tree-walking evaluation of program sections

use crate::cancellation::CancellationToken;
use crate::error::{RuntimeError, RuntimeResult};
use mapcalc_common::{Bounds, ImageError, SharedImage, SharedWritableImage, math};
use mapcalc_compiler::GeneratedProgram;
use mapcalc_compiler::catalog::{FunctionDescriptor, FunctionKind, OutsidePolicy, PositionQuery};
use mapcalc_compiler::codegen::ir::{Expr, LoopGuard, Ordinate, PixelPos, Stmt, VarRef};
use rand::rngs::StdRng;

/// How a block of statements ended
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Flow {
    Normal,
    Break,
    Return(f64),
}

/// Everything the body can touch while one pixel is evaluated
pub(crate) struct Frame<'a> {
    pub program: &'a GeneratedProgram,
    pub sources: &'a [Option<SharedImage>],
    pub destinations: &'a [Option<SharedWritableImage>],
    pub bounds: Bounds,
    pub outside: OutsidePolicy,
    pub x: i64,
    pub y: i64,
    pub image_vars: &'a mut [f64],
    pub locals: &'a mut [f64],
    pub arrays: &'a mut [Vec<f64>],
    pub rng: &'a mut StdRng,
    pub cancellation: Option<&'a CancellationToken>,
}

/// Truthiness used by statements: NaN and zero are false
fn holds(value: f64) -> bool {
    matches!(math::sign(value), Some(s) if s != 0)
}

/// Convert an evaluated band selector to an index
fn band_index(value: f64, bands: usize) -> RuntimeResult<usize> {
    if value.is_nan() || value < 0.0 || value.trunc() as usize >= bands {
        return Err(ImageError::BandOutOfRange {
            band: value.max(0.0) as usize,
            bands,
        }
        .into());
    }
    Ok(value.trunc() as usize)
}

/// Truncate a range bound to a 32-bit counter, saturating at the ends; NaN has none
fn range_bound(value: f64) -> Option<i32> {
    (!value.is_nan()).then(|| value.trunc() as i32)
}

/// Read a source sample, falling back to the outside policy beyond its bounds
pub(crate) fn read_source(image: &SharedImage, name: &str, outside: OutsidePolicy, at: Option<(i64, i64)>, band: usize) -> RuntimeResult<f64> {
    if band >= image.band_count() {
        return Err(ImageError::BandOutOfRange { band, bands: image.band_count() }.into());
    }
    let sample = at.and_then(|(x, y)| image.sample(x, y, band));
    match (sample, outside) {
        (Some(value), _) => Ok(value),
        (None, OutsidePolicy::Value(value)) => Ok(value),
        (None, OutsidePolicy::Fail) => {
            let (x, y) = at.unwrap_or((i64::MIN, i64::MIN));
            Err(RuntimeError::OutOfBounds { image: name.to_string(), x, y })
        }
    }
}

impl Frame<'_> {
    fn load(&self, var: VarRef) -> f64 {
        match var {
            VarRef::Local(slot) => self.locals[slot],
            VarRef::ImageVar(slot) => self.image_vars[slot],
        }
    }

    fn store(&mut self, var: VarRef, value: f64) {
        match var {
            VarRef::Local(slot) => self.locals[slot] = value,
            VarRef::ImageVar(slot) => self.image_vars[slot] = value,
        }
    }

    fn check_cancelled(&self) -> RuntimeResult<()> {
        match self.cancellation {
            Some(token) if token.is_cancelled() => Err(RuntimeError::Cancelled),
            _ => Ok(()),
        }
    }

    fn ordinate(&mut self, ordinate: &Ordinate, current: i64) -> RuntimeResult<f64> {
        Ok(match ordinate {
            Ordinate::Offset(offset) => current as f64 + self.expr(offset)?,
            Ordinate::Absolute(value) => self.expr(value)?,
        })
    }

    fn read(&mut self, image: usize, band: Option<&Expr>, pos: &PixelPos) -> RuntimeResult<f64> {
        let program = self.program;
        let name = program.sources().get(image).map(String::as_str).unwrap_or("?");
        let source = self
            .sources
            .get(image)
            .and_then(Option::as_ref)
            .cloned()
            .ok_or_else(|| RuntimeError::ImageNotBound(name.to_string()))?;
        let band = match band {
            Some(band) => band_index(self.expr(band)?, source.band_count())?,
            None => 0,
        };
        let at = match pos {
            PixelPos::Current => Some((self.x, self.y)),
            PixelPos::At { x, y } => {
                let px = self.ordinate(x, self.x)?;
                let py = self.ordinate(y, self.y)?;
                // NaN coordinates address no pixel at all
                if px.is_nan() || py.is_nan() { None } else { Some((px.trunc() as i64, py.trunc() as i64)) }
            }
        };
        read_source(&source, name, self.outside, at, band)
    }

    fn position(&self, query: PositionQuery) -> f64 {
        let bounds = self.bounds;
        (match query {
            PositionQuery::X => self.x,
            PositionQuery::Y => self.y,
            PositionQuery::Width => bounds.width as i64,
            PositionQuery::Height => bounds.height as i64,
            PositionQuery::MinX => bounds.min_x,
            PositionQuery::MinY => bounds.min_y,
            PositionQuery::MaxX => bounds.max_x(),
            PositionQuery::MaxY => bounds.max_y(),
        }) as f64
    }

    fn call(&mut self, function: &FunctionDescriptor, args: &[Expr]) -> RuntimeResult<f64> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.expr(arg)?);
        }
        let arg = |i: usize| values.get(i).copied().unwrap_or(f64::NAN);
        Ok(match function.kind {
            FunctionKind::Unary(f) => f(arg(0)),
            FunctionKind::Binary(f) => f(arg(0), arg(1)),
            FunctionKind::Variadic(f) => f(&values),
            FunctionKind::Position(query) => self.position(query),
            FunctionKind::Random(f) => f(&mut *self.rng, arg(0)),
        })
    }

    pub(crate) fn expr(&mut self, expr: &Expr) -> RuntimeResult<f64> {
        Ok(match expr {
            Expr::Const(value) => *value,
            Expr::Var(var) => self.load(*var),
            Expr::Read { image, band, pos } => self.read(*image, band.as_deref(), pos)?,
            Expr::Neg(operand) => -self.expr(operand)?,
            Expr::Arith { op, lhs, rhs } => {
                let a = self.expr(lhs)?;
                op.apply(a, self.expr(rhs)?)
            }
            Expr::Logic { op, lhs, rhs } => {
                let a = self.expr(lhs)?;
                op.apply(a, self.expr(rhs)?)
            }
            Expr::Not(operand) => math::not(self.expr(operand)?),
            Expr::Call { function, args } => self.call(function, args)?,
            Expr::Select { cond, nonzero, zero, negative } => match math::sign(self.expr(cond)?) {
                None => f64::NAN,
                Some(0) => self.expr(zero)?,
                Some(s) if s < 0 => self.expr(negative.as_deref().unwrap_or(nonzero))?,
                Some(_) => self.expr(nonzero)?,
            },
            Expr::Update { var, delta, prefix } => {
                let old = self.load(*var);
                let new = old + delta;
                self.store(*var, new);
                if *prefix { new } else { old }
            }
        })
    }

    fn write(&mut self, image: usize, band: Option<&Expr>, value: &Expr) -> RuntimeResult<()> {
        let program = self.program;
        let name = program.destinations().get(image).map(String::as_str).unwrap_or("?");
        let destination = self
            .destinations
            .get(image)
            .and_then(Option::as_ref)
            .cloned()
            .ok_or_else(|| RuntimeError::ImageNotBound(name.to_string()))?;
        let band = match band {
            Some(band) => band_index(self.expr(band)?, destination.band_count())?,
            None => 0,
        };
        let value = self.expr(value)?;
        destination.set_sample(self.x, self.y, band, value)?;
        Ok(())
    }

    fn run_loop(&mut self, body: &[Stmt]) -> RuntimeResult<Option<Flow>> {
        self.check_cancelled()?;
        Ok(match self.block(body)? {
            Flow::Normal => None,
            Flow::Break => Some(Flow::Normal),
            ret @ Flow::Return(_) => Some(ret),
        })
    }

    pub(crate) fn block(&mut self, stmts: &[Stmt]) -> RuntimeResult<Flow> {
        for stmt in stmts {
            let flow = self.stmt(stmt)?;
            if flow != Flow::Normal {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    fn stmt(&mut self, stmt: &Stmt) -> RuntimeResult<Flow> {
        match stmt {
            Stmt::Assign { var, value } => {
                let value = self.expr(value)?;
                self.store(*var, value);
            }
            Stmt::Write { image, band, value } => self.write(*image, band.as_ref(), value)?,
            Stmt::Eval(expr) => {
                self.expr(expr)?;
            }
            Stmt::If { cond, then, otherwise } => {
                let branch = if holds(self.expr(cond)?) { then } else { otherwise };
                return self.block(branch);
            }
            Stmt::Loop { guard, body } => loop {
                let proceed = match guard {
                    LoopGuard::While(cond) => holds(self.expr(cond)?),
                    LoopGuard::Until(cond) => math::sign(self.expr(cond)?) == Some(0),
                };
                if !proceed {
                    break;
                }
                if let Some(flow) = self.run_loop(body)? {
                    return Ok(flow);
                }
            },
            Stmt::BreakIf(cond) => {
                if holds(self.expr(cond)?) {
                    return Ok(Flow::Break);
                }
            }
            Stmt::Break => return Ok(Flow::Break),
            Stmt::ForeachList { var, array, items, body } => {
                let mut values = std::mem::take(&mut self.arrays[*array]);
                values.clear();
                for item in items {
                    values.push(self.expr(item)?);
                }
                self.arrays[*array] = values;
                for i in 0..self.arrays[*array].len() {
                    self.locals[*var] = self.arrays[*array][i];
                    if let Some(flow) = self.run_loop(body)? {
                        return Ok(flow);
                    }
                }
            }
            Stmt::ForeachRange { var, lo, hi, body } => {
                let lo = self.expr(lo)?;
                let hi = self.expr(hi)?;
                let (Some(lo), Some(hi)) = (range_bound(lo), range_bound(hi)) else {
                    return Ok(Flow::Normal);
                };
                for i in lo..=hi {
                    self.locals[*var] = f64::from(i);
                    if let Some(flow) = self.run_loop(body)? {
                        return Ok(flow);
                    }
                }
            }
            Stmt::Return(value) => return Ok(Flow::Return(self.expr(value)?)),
        }
        Ok(Flow::Normal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_holds() {
        assert!(holds(2.0));
        assert!(holds(-0.5));
        assert!(!holds(0.0));
        assert!(!holds(f64::NAN));
    }

    #[test]
    fn test_range_bound_saturates() {
        assert_eq!(range_bound(-2.9), Some(-2));
        assert_eq!(range_bound(f64::NEG_INFINITY), Some(i32::MIN));
        assert_eq!(range_bound(f64::INFINITY), Some(i32::MAX));
        assert_eq!(range_bound(1e300), Some(i32::MAX));
        assert_eq!(range_bound(f64::NAN), None);
    }

    #[test]
    fn test_band_index() {
        assert_eq!(band_index(1.7, 2).unwrap(), 1);
        assert!(band_index(2.0, 2).is_err());
        assert!(band_index(-1.0, 2).is_err());
        assert!(band_index(f64::NAN, 2).is_err());
    }
}
