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

//! Constant folding over program IR
//!
//! Arithmetic, logic and pure calls whose operands are all constants are
//! replaced by their value. Volatile and position-dependent calls are never
//! folded, and neither is anything reading images or variables.

use super::ir::{Expr, LoopGuard, Ordinate, PixelPos, Stmt};
use mapcalc_common::math;

/// Fold an expression tree
pub fn fold_expr(expr: Expr) -> Expr {
    match expr {
        Expr::Const(_) | Expr::Var(_) | Expr::Update { .. } => expr,
        Expr::Read { image, band, pos } => Expr::Read {
            image,
            band: band.map(|band| fold_expr(*band).boxed()),
            pos: match pos {
                PixelPos::Current => PixelPos::Current,
                PixelPos::At { x, y } => PixelPos::At {
                    x: fold_ordinate(x),
                    y: fold_ordinate(y),
                },
            },
        },
        Expr::Neg(operand) => match fold_expr(*operand) {
            Expr::Const(value) => Expr::Const(-value),
            operand => Expr::Neg(operand.boxed()),
        },
        Expr::Not(operand) => match fold_expr(*operand) {
            Expr::Const(value) => Expr::Const(math::not(value)),
            operand => Expr::Not(operand.boxed()),
        },
        Expr::Arith { op, lhs, rhs } => match (fold_expr(*lhs), fold_expr(*rhs)) {
            (Expr::Const(a), Expr::Const(b)) => Expr::Const(op.apply(a, b)),
            (lhs, rhs) => Expr::Arith {
                op,
                lhs: lhs.boxed(),
                rhs: rhs.boxed(),
            },
        },
        Expr::Logic { op, lhs, rhs } => match (fold_expr(*lhs), fold_expr(*rhs)) {
            (Expr::Const(a), Expr::Const(b)) => Expr::Const(op.apply(a, b)),
            (lhs, rhs) => Expr::Logic {
                op,
                lhs: lhs.boxed(),
                rhs: rhs.boxed(),
            },
        },
        Expr::Call { function, args } => {
            let args: Vec<Expr> = args.into_iter().map(fold_expr).collect();
            if function.is_foldable() {
                let values: Option<Vec<f64>> = args.iter().map(Expr::as_const).collect();
                if let Some(value) = values.and_then(|values| function.call_pure(&values)) {
                    return Expr::Const(value);
                }
            }
            Expr::Call { function, args }
        }
        Expr::Select { cond, nonzero, zero, negative } => {
            let cond = fold_expr(*cond);
            let nonzero = fold_expr(*nonzero);
            let zero = fold_expr(*zero);
            let negative = negative.map(|n| fold_expr(*n).boxed());
            match cond.as_const().map(math::sign) {
                Some(None) => Expr::Const(f64::NAN),
                Some(Some(0)) => zero,
                Some(Some(s)) if s < 0 => negative.map(|n| *n).unwrap_or(nonzero),
                Some(Some(_)) => nonzero,
                None => Expr::Select {
                    cond: cond.boxed(),
                    nonzero: nonzero.boxed(),
                    zero: zero.boxed(),
                    negative,
                },
            }
        }
    }
}

fn fold_ordinate(ordinate: Ordinate) -> Ordinate {
    match ordinate {
        Ordinate::Offset(expr) => Ordinate::Offset(fold_expr(*expr).boxed()),
        Ordinate::Absolute(expr) => Ordinate::Absolute(fold_expr(*expr).boxed()),
    }
}

/// Fold every expression in a statement list
pub fn fold_stmts(stmts: Vec<Stmt>) -> Vec<Stmt> {
    stmts.into_iter().map(fold_stmt).collect()
}

fn fold_stmt(stmt: Stmt) -> Stmt {
    match stmt {
        Stmt::Assign { var, value } => Stmt::Assign { var, value: fold_expr(value) },
        Stmt::Write { image, band, value } => Stmt::Write {
            image,
            band: band.map(fold_expr),
            value: fold_expr(value),
        },
        Stmt::Eval(expr) => Stmt::Eval(fold_expr(expr)),
        Stmt::If { cond, then, otherwise } => Stmt::If {
            cond: fold_expr(cond),
            then: fold_stmts(then),
            otherwise: fold_stmts(otherwise),
        },
        Stmt::Loop { guard, body } => Stmt::Loop {
            guard: match guard {
                LoopGuard::While(cond) => LoopGuard::While(fold_expr(cond)),
                LoopGuard::Until(cond) => LoopGuard::Until(fold_expr(cond)),
            },
            body: fold_stmts(body),
        },
        Stmt::BreakIf(cond) => Stmt::BreakIf(fold_expr(cond)),
        Stmt::Break => Stmt::Break,
        Stmt::ForeachList { var, array, items, body } => Stmt::ForeachList {
            var,
            array,
            items: items.into_iter().map(fold_expr).collect(),
            body: fold_stmts(body),
        },
        Stmt::ForeachRange { var, lo, hi, body } => Stmt::ForeachRange {
            var,
            lo: fold_expr(lo),
            hi: fold_expr(hi),
            body: fold_stmts(body),
        },
        Stmt::Return(expr) => Stmt::Return(fold_expr(expr)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FunctionCatalog;
    use crate::codegen::ir::{ArithOp, VarRef};

    #[test]
    fn test_folds_pure_arithmetic_and_calls() {
        let catalog = FunctionCatalog::standard();
        let expr = Expr::Arith {
            op: ArithOp::Mul,
            lhs: Expr::Const(2.0).boxed(),
            rhs: Expr::Call {
                function: catalog.resolve("sqrt", 1).unwrap(),
                args: vec![Expr::Const(16.0)],
            }
            .boxed(),
        };
        assert_eq!(fold_expr(expr), Expr::Const(8.0));
    }

    #[test]
    fn test_keeps_volatile_and_position_calls() {
        let catalog = FunctionCatalog::standard();
        for (name, args) in [("rand", vec![Expr::Const(1.0)]), ("x", vec![])] {
            let call = Expr::Call {
                function: catalog.resolve(name, args.len()).unwrap(),
                args,
            };
            assert_eq!(fold_expr(call.clone()), call);
        }
    }

    #[test]
    fn test_select_on_constant_condition() {
        let select = |cond: f64| Expr::Select {
            cond: Expr::Const(cond).boxed(),
            nonzero: Expr::Var(VarRef::Local(0)).boxed(),
            zero: Expr::Const(0.0).boxed(),
            negative: Some(Expr::Const(-1.0).boxed()),
        };
        assert_eq!(fold_expr(select(2.0)), Expr::Var(VarRef::Local(0)));
        assert_eq!(fold_expr(select(0.0)), Expr::Const(0.0));
        assert_eq!(fold_expr(select(-3.0)), Expr::Const(-1.0));
        assert!(matches!(fold_expr(select(f64::NAN)), Expr::Const(v) if v.is_nan()));
    }
}
