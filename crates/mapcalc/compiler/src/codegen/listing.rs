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

//! Human-readable listing of a generated program

use super::ir::{Expr, LoopGuard, Ordinate, PixelPos, Stmt, VarRef};
use super::program::GeneratedProgram;
use crate::catalog::options::{OptionSetting, OutsidePolicy};
use std::fmt::{self, Write};

const INDENT: &str = "    ";

impl fmt::Display for GeneratedProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listing = Listing { program: self };
        writeln!(f, "program ({:?})", self.model())?;

        writeln!(f, "declarations:")?;
        for name in self.sources() {
            writeln!(f, "{INDENT}source {name}")?;
        }
        for name in self.destinations() {
            writeln!(f, "{INDENT}destination {name}")?;
        }
        for name in self.image_vars() {
            writeln!(f, "{INDENT}var {name}")?;
        }

        writeln!(f, "defaults:")?;
        for (name, value) in self.image_vars().iter().zip(self.defaults()) {
            writeln!(f, "{INDENT}{name} = {value}")?;
        }

        writeln!(f, "init:")?;
        for init in self.image_init() {
            writeln!(f, "{INDENT}{} = {}", listing.var(VarRef::ImageVar(init.slot)), listing.expr(&init.value))?;
        }

        writeln!(f, "options:")?;
        for init in self.option_init() {
            let state = if init.active { "set" } else { "default" };
            let value = match &init.setting {
                OptionSetting::Outside(OutsidePolicy::Fail) => "fail".to_string(),
                OptionSetting::Outside(OutsidePolicy::Value(v)) => v.to_string(),
            };
            writeln!(f, "{INDENT}{} = {value} ({state})", init.name)?;
        }

        writeln!(f, "body:")?;
        let mut text = String::new();
        listing.stmts(&mut text, self.body(), 1)?;
        f.write_str(&text)?;

        writeln!(f, "accessor:")?;
        for branch in self.accessor() {
            writeln!(f, "{INDENT}\"{}\" -> slot {}", branch.name, branch.slot)?;
        }
        Ok(())
    }
}

struct Listing<'p> {
    program: &'p GeneratedProgram,
}

impl Listing<'_> {
    fn var(&self, var: VarRef) -> String {
        match var {
            VarRef::Local(slot) if Some(slot) == self.program.result_slot() => "result".to_string(),
            VarRef::Local(slot) => format!("t{slot}"),
            VarRef::ImageVar(slot) => self.program.image_vars().get(slot).cloned().unwrap_or_else(|| format!("image_var{slot}")),
        }
    }

    fn name<'n>(names: &'n [String], index: usize) -> &'n str {
        names.get(index).map(String::as_str).unwrap_or("?")
    }

    fn ordinate(&self, ordinate: &Ordinate) -> String {
        match ordinate {
            Ordinate::Offset(expr) => self.expr(expr),
            Ordinate::Absolute(expr) => format!("${}", self.expr(expr)),
        }
    }

    fn expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Const(value) => value.to_string(),
            Expr::Var(var) => self.var(*var),
            Expr::Read { image, band, pos } => {
                let mut text = Self::name(self.program.sources(), *image).to_string();
                if let Some(band) = band {
                    text.push_str(&format!("[{}]", self.expr(band)));
                }
                if let PixelPos::At { x, y } = pos {
                    text.push_str(&format!("[{}, {}]", self.ordinate(x), self.ordinate(y)));
                }
                text
            }
            Expr::Neg(operand) => format!("-{}", self.expr(operand)),
            Expr::Not(operand) => format!("NOT({})", self.expr(operand)),
            Expr::Arith { op, lhs, rhs } => format!("({} {} {})", self.expr(lhs), op.symbol(), self.expr(rhs)),
            Expr::Logic { op, lhs, rhs } => format!("{}({}, {})", op.helper(), self.expr(lhs), self.expr(rhs)),
            Expr::Call { function, args } => {
                let args: Vec<String> = args.iter().map(|arg| self.expr(arg)).collect();
                format!("{}({})", function.name, args.join(", "))
            }
            Expr::Select { cond, nonzero, zero, negative } => match negative {
                Some(negative) => format!(
                    "select({}: +{}, 0{}, -{})",
                    self.expr(cond),
                    self.expr(nonzero),
                    self.expr(zero),
                    self.expr(negative)
                ),
                None => format!("select({}: {}, 0{})", self.expr(cond), self.expr(nonzero), self.expr(zero)),
            },
            Expr::Update { var, delta, prefix } => {
                let op = if *delta > 0.0 { "++" } else { "--" };
                if *prefix { format!("{op}{}", self.var(*var)) } else { format!("{}{op}", self.var(*var)) }
            }
        }
    }

    fn stmts(&self, out: &mut String, stmts: &[Stmt], depth: usize) -> fmt::Result {
        for stmt in stmts {
            self.stmt(out, stmt, depth)?;
        }
        Ok(())
    }

    fn block(&self, out: &mut String, header: String, body: &[Stmt], depth: usize) -> fmt::Result {
        let pad = INDENT.repeat(depth);
        writeln!(out, "{pad}{header} {{")?;
        self.stmts(out, body, depth + 1)?;
        writeln!(out, "{pad}}}")
    }

    fn stmt(&self, out: &mut String, stmt: &Stmt, depth: usize) -> fmt::Result {
        let pad = INDENT.repeat(depth);
        match stmt {
            Stmt::Assign { var, value } => writeln!(out, "{pad}{} = {}", self.var(*var), self.expr(value)),
            Stmt::Write { image, band, value } => {
                let name = Self::name(self.program.destinations(), *image);
                match band {
                    Some(band) => writeln!(out, "{pad}write {name}[{}] <- {}", self.expr(band), self.expr(value)),
                    None => writeln!(out, "{pad}write {name} <- {}", self.expr(value)),
                }
            }
            Stmt::Eval(expr) => writeln!(out, "{pad}{}", self.expr(expr)),
            Stmt::If { cond, then, otherwise } => {
                self.block(out, format!("if {}", self.expr(cond)), then, depth)?;
                if !otherwise.is_empty() {
                    self.block(out, "else".to_string(), otherwise, depth)?;
                }
                Ok(())
            }
            Stmt::Loop { guard, body } => {
                let header = match guard {
                    LoopGuard::While(cond) => format!("while {}", self.expr(cond)),
                    LoopGuard::Until(cond) => format!("until {}", self.expr(cond)),
                };
                self.block(out, header, body, depth)
            }
            Stmt::BreakIf(cond) => writeln!(out, "{pad}breakif {}", self.expr(cond)),
            Stmt::Break => writeln!(out, "{pad}break"),
            Stmt::ForeachList { var, array, items, body } => {
                let items: Vec<String> = items.iter().map(|item| self.expr(item)).collect();
                let header = format!("foreach {} in array{array} {{{}}}", self.var(VarRef::Local(*var)), items.join(", "));
                self.block(out, header, body, depth)
            }
            Stmt::ForeachRange { var, lo, hi, body } => {
                let header = format!("foreach {} in {}:{}", self.var(VarRef::Local(*var)), self.expr(lo), self.expr(hi));
                self.block(out, header, body, depth)
            }
            Stmt::Return(expr) => writeln!(out, "{pad}return {}", self.expr(expr)),
        }
    }
}
