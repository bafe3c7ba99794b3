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

//! Translation of the annotated syntax tree into program IR

use super::context::AssemblyContext;
use super::error::{AssemblyError, AssemblyResult};
use super::ir::{self, ArithOp, EvaluationModel, LogicOp, LoopGuard, Ordinate, PixelPos, VarRef};
use crate::ast::{self, AssignOp, AssignTarget, BinaryOp, Binding, Coord, ExprKind, Ident, ImageRef, LoopSource, StmtKind, UnaryOp, UpdateOp};
use crate::catalog::functions::POW;

fn internal(message: impl Into<String>) -> AssemblyError {
    AssemblyError::Internal(message.into())
}

fn binding(ident: &Ident) -> AssemblyResult<Binding> {
    ident.binding.ok_or_else(|| internal(format!("'{}' at {} was not bound by analysis", ident.name, ident.position)))
}

fn var_ref(ident: &Ident) -> AssemblyResult<VarRef> {
    match binding(ident)? {
        Binding::Local(slot) => Ok(VarRef::Local(slot)),
        Binding::ImageVar(slot) => Ok(VarRef::ImageVar(slot)),
        other => Err(internal(format!("'{}' is bound to {other:?}, not a variable", ident.name))),
    }
}

impl AssemblyContext<'_> {
    /// Translate an expression
    pub fn translate_expr(&self, expr: &ast::Expr) -> AssemblyResult<ir::Expr> {
        Ok(match &expr.kind {
            ExprKind::Number(value) => ir::Expr::Const(*value),
            ExprKind::Var(ident) => match binding(ident)? {
                Binding::Constant(value) => ir::Expr::Const(value),
                Binding::Local(slot) => ir::Expr::Var(VarRef::Local(slot)),
                Binding::ImageVar(slot) => ir::Expr::Var(VarRef::ImageVar(slot)),
                Binding::Source(image) => ir::Expr::Read {
                    image,
                    band: None,
                    pos: PixelPos::Current,
                },
                Binding::Destination(_) => return Err(internal(format!("destination '{}' reached a read position", ident.name))),
            },
            ExprKind::Image(image) => self.translate_read(image)?,
            ExprKind::Call { name, args, resolved } => {
                let args = args.iter().map(|arg| self.translate_expr(arg)).collect::<AssemblyResult<Vec<_>>>()?;
                if name == "if" || name == "con" {
                    return conditional(name, args);
                }
                let function = resolved.ok_or_else(|| internal(format!("call to '{name}' was not resolved by analysis")))?;
                ir::Expr::Call { function, args }
            }
            ExprKind::Unary { op, operand } => {
                let operand = self.translate_expr(operand)?;
                match op {
                    UnaryOp::Neg => ir::Expr::Neg(operand.boxed()),
                    UnaryOp::Plus => operand,
                    UnaryOp::Not => ir::Expr::Not(operand.boxed()),
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.translate_expr(lhs)?;
                let rhs = self.translate_expr(rhs)?;
                binary(*op, lhs, rhs)
            }
            ExprKind::Ternary { cond, then, otherwise } => ir::Expr::Select {
                cond: self.translate_expr(cond)?.boxed(),
                nonzero: self.translate_expr(then)?.boxed(),
                zero: self.translate_expr(otherwise)?.boxed(),
                negative: None,
            },
            ExprKind::Update { target, op, prefix } => ir::Expr::Update {
                var: var_ref(target)?,
                delta: if *op == UpdateOp::Increment { 1.0 } else { -1.0 },
                prefix: *prefix,
            },
        })
    }

    fn translate_read(&self, image: &ImageRef) -> AssemblyResult<ir::Expr> {
        let Binding::Source(index) = binding(&image.image)? else {
            return Err(internal(format!("'{}' is read with image syntax but is not a source", image.image.name)));
        };
        let band = image.band.as_ref().map(|band| self.translate_expr(band).map(ir::Expr::boxed)).transpose()?;
        let pos = match &image.pixel {
            None => PixelPos::Current,
            Some(pixel) => PixelPos::At {
                x: self.translate_ordinate(&pixel.x)?,
                y: self.translate_ordinate(&pixel.y)?,
            },
        };
        Ok(ir::Expr::Read { image: index, band, pos })
    }

    fn translate_ordinate(&self, coord: &Coord) -> AssemblyResult<Ordinate> {
        Ok(match coord {
            Coord::Relative(expr) => Ordinate::Offset(self.translate_expr(expr)?.boxed()),
            Coord::Absolute(expr) => Ordinate::Absolute(self.translate_expr(expr)?.boxed()),
        })
    }

    /// Translate a statement list, flattening nested blocks
    pub fn translate_stmts(&mut self, stmts: &[ast::Stmt]) -> AssemblyResult<Vec<ir::Stmt>> {
        let mut out = Vec::with_capacity(stmts.len());
        for stmt in stmts {
            self.translate_stmt(stmt, &mut out)?;
        }
        Ok(out)
    }

    fn translate_nested(&mut self, stmt: &ast::Stmt) -> AssemblyResult<Vec<ir::Stmt>> {
        let mut out = Vec::new();
        self.translate_stmt(stmt, &mut out)?;
        Ok(out)
    }

    fn translate_stmt(&mut self, stmt: &ast::Stmt, out: &mut Vec<ir::Stmt>) -> AssemblyResult<()> {
        match &stmt.kind {
            StmtKind::Assign { target, op, value } => {
                let value = self.translate_expr(value)?;
                out.push(self.translate_assign(target, *op, value)?);
            }
            StmtKind::Expr(expr) => out.push(ir::Stmt::Eval(self.translate_expr(expr)?)),
            StmtKind::Block(stmts) => {
                for stmt in stmts {
                    self.translate_stmt(stmt, out)?;
                }
            }
            StmtKind::If { cond, then, otherwise } => {
                let cond = self.translate_expr(cond)?;
                let then = self.translate_nested(then)?;
                let otherwise = match otherwise {
                    Some(otherwise) => self.translate_nested(otherwise)?,
                    None => Vec::new(),
                };
                out.push(ir::Stmt::If { cond, then, otherwise });
            }
            StmtKind::While { cond, body } => {
                let guard = LoopGuard::While(self.translate_expr(cond)?);
                let body = self.translate_nested(body)?;
                out.push(ir::Stmt::Loop { guard, body });
            }
            StmtKind::Until { cond, body } => {
                let guard = LoopGuard::Until(self.translate_expr(cond)?);
                let body = self.translate_nested(body)?;
                out.push(ir::Stmt::Loop { guard, body });
            }
            StmtKind::Foreach { var, source, body } => {
                let VarRef::Local(var) = var_ref(var)? else {
                    return Err(internal("loop variable bound to an image-scope slot"));
                };
                match source {
                    LoopSource::List(items) => {
                        let items = items.iter().map(|item| self.translate_expr(item)).collect::<AssemblyResult<Vec<_>>>()?;
                        let array = self.allocate_array();
                        let body = self.translate_nested(body)?;
                        out.push(ir::Stmt::ForeachList { var, array, items, body });
                    }
                    LoopSource::Range { lo, hi } => {
                        let lo = self.translate_expr(lo)?;
                        let hi = self.translate_expr(hi)?;
                        let body = self.translate_nested(body)?;
                        out.push(ir::Stmt::ForeachRange { var, lo, hi, body });
                    }
                }
            }
            StmtKind::BreakIf(cond) => out.push(ir::Stmt::BreakIf(self.translate_expr(cond)?)),
            StmtKind::Break => out.push(ir::Stmt::Break),
            StmtKind::Empty => {}
        }
        Ok(())
    }

    fn translate_assign(&self, target: &AssignTarget, op: AssignOp, value: ir::Expr) -> AssemblyResult<ir::Stmt> {
        let ident = target.ident();
        if let Binding::Destination(image) = binding(ident)? {
            if op.is_compound() {
                return Err(internal(format!("compound assignment to destination '{}'", ident.name)));
            }
            let band = match target {
                AssignTarget::Image(ImageRef { band: Some(band), .. }) => Some(self.translate_expr(band)?),
                _ => None,
            };
            return match self.model() {
                EvaluationModel::Direct => Ok(ir::Stmt::Write { image, band, value }),
                EvaluationModel::Indirect if band.is_some() => {
                    Err(AssemblyError::Unsupported(format!("band selection on destination '{}' in the indirect model", ident.name)))
                }
                EvaluationModel::Indirect => Ok(ir::Stmt::Assign {
                    var: VarRef::Local(self.result_slot()?),
                    value,
                }),
            };
        }

        let var = var_ref(ident)?;
        let op = match op {
            AssignOp::Assign => return Ok(ir::Stmt::Assign { var, value }),
            AssignOp::Add => ArithOp::Add,
            AssignOp::Sub => ArithOp::Sub,
            AssignOp::Mul => ArithOp::Mul,
            AssignOp::Div => ArithOp::Div,
            AssignOp::Rem => ArithOp::Rem,
        };
        Ok(ir::Stmt::Assign {
            var,
            value: ir::Expr::Arith {
                op,
                lhs: ir::Expr::Var(var).boxed(),
                rhs: value.boxed(),
            },
        })
    }
}

fn binary(op: BinaryOp, lhs: ir::Expr, rhs: ir::Expr) -> ir::Expr {
    let (lhs, rhs) = (lhs.boxed(), rhs.boxed());
    let logic = match op {
        BinaryOp::Add => return ir::Expr::Arith { op: ArithOp::Add, lhs, rhs },
        BinaryOp::Sub => return ir::Expr::Arith { op: ArithOp::Sub, lhs, rhs },
        BinaryOp::Mul => return ir::Expr::Arith { op: ArithOp::Mul, lhs, rhs },
        BinaryOp::Div => return ir::Expr::Arith { op: ArithOp::Div, lhs, rhs },
        BinaryOp::Rem => return ir::Expr::Arith { op: ArithOp::Rem, lhs, rhs },
        BinaryOp::Pow => {
            return ir::Expr::Call {
                function: POW,
                args: vec![*lhs, *rhs],
            };
        }
        BinaryOp::Gt => LogicOp::Gt,
        BinaryOp::Ge => LogicOp::Ge,
        BinaryOp::Lt => LogicOp::Lt,
        BinaryOp::Le => LogicOp::Le,
        BinaryOp::Eq => LogicOp::Eq,
        BinaryOp::Ne => LogicOp::Ne,
        BinaryOp::And => LogicOp::And,
        BinaryOp::Or => LogicOp::Or,
        BinaryOp::Xor => LogicOp::Xor,
    };
    ir::Expr::Logic { op: logic, lhs, rhs }
}

/// Fixed expansion of the `if`/`con` family
fn conditional(name: &str, args: Vec<ir::Expr>) -> AssemblyResult<ir::Expr> {
    let arg_count = args.len();
    let mut args = args.into_iter();
    let (Some(cond), a, b, c) = (args.next(), args.next(), args.next(), args.next()) else {
        return Err(internal(format!("'{name}' called without arguments")));
    };
    let (nonzero, zero, negative) = match (a, b, c) {
        (None, None, None) => (ir::Expr::Const(1.0), ir::Expr::Const(0.0), None),
        (Some(a), None, None) => (a, ir::Expr::Const(0.0), None),
        (Some(a), Some(b), None) => (a, b, None),
        (Some(a), Some(b), Some(c)) if arg_count == 4 => (a, b, Some(c.boxed())),
        _ => return Err(internal(format!("'{name}' called with {arg_count} arguments"))),
    };
    Ok(ir::Expr::Select {
        cond: cond.boxed(),
        nonzero: nonzero.boxed(),
        zero: zero.boxed(),
        negative,
    })
}
