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

//! Intermediate representation of a generated per-pixel program
//!
//! Expressions are trees over numeric values; every name has already been
//! turned into a storage slot or an image index.

use crate::catalog::functions::FunctionDescriptor;
use mapcalc_common::math;
use serde::{Deserialize, Serialize};

/// How destination values leave the per-pixel body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EvaluationModel {
    /// The body writes destination samples itself
    #[default]
    Direct,
    /// The body returns one value, written by the caller to the single destination
    Indirect,
}

/// Storage slot of a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarRef {
    /// Pixel-scope, loop or synthesized variable
    Local(usize),
    /// Image-scope variable
    ImageVar(usize),
}

/// One ordinate of a pixel position
#[derive(Debug, Clone, PartialEq)]
pub enum Ordinate {
    /// Offset from the pixel being evaluated
    Offset(Box<Expr>),
    Absolute(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PixelPos {
    Current,
    At { x: Ordinate, y: Ordinate },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl ArithOp {
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            ArithOp::Add => a + b,
            ArithOp::Sub => a - b,
            ArithOp::Mul => a * b,
            ArithOp::Div => a / b,
            ArithOp::Rem => a % b,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Rem => "%",
        }
    }
}

/// Three-valued comparison and boolean operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicOp {
    And,
    Or,
    Xor,
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
}

impl LogicOp {
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            LogicOp::And => math::and(a, b),
            LogicOp::Or => math::or(a, b),
            LogicOp::Xor => math::xor(a, b),
            LogicOp::Gt => math::gt(a, b),
            LogicOp::Ge => math::ge(a, b),
            LogicOp::Lt => math::lt(a, b),
            LogicOp::Le => math::le(a, b),
            LogicOp::Eq => math::eq(a, b),
            LogicOp::Ne => math::ne(a, b),
        }
    }

    /// Helper name shown in listings
    pub fn helper(self) -> &'static str {
        match self {
            LogicOp::And => "AND",
            LogicOp::Or => "OR",
            LogicOp::Xor => "XOR",
            LogicOp::Gt => "GT",
            LogicOp::Ge => "GE",
            LogicOp::Lt => "LT",
            LogicOp::Le => "LE",
            LogicOp::Eq => "EQ",
            LogicOp::Ne => "NE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(f64),
    Var(VarRef),
    /// Sample of a source image
    Read {
        image: usize,
        band: Option<Box<Expr>>,
        pos: PixelPos,
    },
    Neg(Box<Expr>),
    Arith {
        op: ArithOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Logic {
        op: LogicOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Not(Box<Expr>),
    /// Direct call; variadic targets receive all arguments as one slice
    Call {
        function: FunctionDescriptor,
        args: Vec<Expr>,
    },
    /// Lazy selection on the sign of `cond`. NaN selects NaN, a positive
    /// sign `nonzero`, zero `zero`, and a negative sign `negative` when
    /// present, otherwise `nonzero`.
    Select {
        cond: Box<Expr>,
        nonzero: Box<Expr>,
        zero: Box<Expr>,
        negative: Option<Box<Expr>>,
    },
    /// `++`/`--` on a variable, yielding the old (postfix) or new (prefix) value
    Update {
        var: VarRef,
        delta: f64,
        prefix: bool,
    },
}

impl Expr {
    pub fn boxed(self) -> Box<Expr> {
        Box::new(self)
    }

    pub fn as_const(&self) -> Option<f64> {
        match self {
            Expr::Const(value) => Some(*value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoopGuard {
    /// Continue while the sign is non-zero
    While(Expr),
    /// Continue while the sign is zero
    Until(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assign {
        var: VarRef,
        value: Expr,
    },
    /// Direct model: write a destination sample at the current pixel
    Write {
        image: usize,
        band: Option<Expr>,
        value: Expr,
    },
    Eval(Expr),
    /// NaN conditions take the `otherwise` branch
    If {
        cond: Expr,
        then: Vec<Stmt>,
        otherwise: Vec<Stmt>,
    },
    Loop {
        guard: LoopGuard,
        body: Vec<Stmt>,
    },
    /// Leave the innermost loop when the sign is non-zero
    BreakIf(Expr),
    Break,
    /// Items are materialized into array `array` once, then bound to `var` in turn
    ForeachList {
        var: usize,
        array: usize,
        items: Vec<Expr>,
        body: Vec<Stmt>,
    },
    /// Bounds are evaluated once and truncated; both are inclusive
    ForeachRange {
        var: usize,
        lo: Expr,
        hi: Expr,
        body: Vec<Stmt>,
    },
    /// Indirect model: end of the body
    Return(Expr),
}
