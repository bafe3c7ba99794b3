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

//! Script syntax tree
//!
//! The parser produces this tree with every `binding` and `resolved` slot empty.
//! Semantic analysis fills them in; the program assembler only accepts a tree
//! in which every slot it needs has been filled.

use crate::catalog::functions::FunctionDescriptor;
use crate::catalog::options::OptionLiteral;
use crate::parser::position::Position;
use serde::{Deserialize, Serialize};

/// Role an image plays in a script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageRole {
    /// Read-only input image
    Source,
    /// Output image written by the script
    Destination,
}

/// What a name refers to, as decided by semantic analysis
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Binding {
    /// Index into the program's source image table
    Source(usize),
    /// Index into the program's destination image table
    Destination(usize),
    /// Slot of an image-scope variable
    ImageVar(usize),
    /// Slot of a pixel-scope (or loop) variable
    Local(usize),
    /// Named constant
    Constant(f64),
}

/// A name occurrence in the tree
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub position: Position,
    pub binding: Option<Binding>,
}

impl Ident {
    pub fn new(name: impl Into<String>, position: Position) -> Self {
        Self {
            name: name.into(),
            position,
            binding: None,
        }
    }
}

/// A complete script
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    pub options: Vec<OptionEntry>,
    pub images: Vec<ImageDecl>,
    pub init: Vec<InitDecl>,
    pub body: Vec<Stmt>,
}

/// `name = value;` inside an `options` block
#[derive(Debug, Clone, PartialEq)]
pub struct OptionEntry {
    pub name: String,
    pub value: OptionLiteral,
    pub position: Position,
}

/// `name = read|write;` inside an `images` block
#[derive(Debug, Clone, PartialEq)]
pub struct ImageDecl {
    pub name: String,
    pub role: ImageRole,
    pub position: Position,
}

/// Image-scope variable declared in an `init` block
#[derive(Debug, Clone, PartialEq)]
pub struct InitDecl {
    pub name: Ident,
    pub value: Option<Expr>,
}

/// One coordinate of a pixel position
#[derive(Debug, Clone, PartialEq)]
pub enum Coord {
    /// Offset from the pixel being evaluated
    Relative(Box<Expr>),
    /// Absolute ordinate (`$expr`)
    Absolute(Box<Expr>),
}

/// `[x, y]` part of an image reference
#[derive(Debug, Clone, PartialEq)]
pub struct PixelRef {
    pub x: Coord,
    pub y: Coord,
}

/// Image reference with band and/or position selectors
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRef {
    pub image: Ident,
    pub band: Option<Box<Expr>>,
    pub pixel: Option<PixelRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
    And,
    Or,
    Xor,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Pow => "^",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Xor => "^|",
        }
    }
}

/// `++` or `--`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub position: Position,
}

impl Expr {
    pub fn new(kind: ExprKind, position: Position) -> Self {
        Self { kind, position }
    }

    pub fn number(value: f64, position: Position) -> Self {
        Self::new(ExprKind::Number(value), position)
    }

    pub fn var(name: impl Into<String>, position: Position) -> Self {
        Self::new(ExprKind::Var(Ident::new(name, position)), position)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Number(f64),
    Var(Ident),
    Image(ImageRef),
    Call {
        name: String,
        args: Vec<Expr>,
        /// Catalog entry chosen by analysis; `if`/`con` stay unresolved
        resolved: Option<FunctionDescriptor>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `cond ? then : otherwise`
    Ternary {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    /// `++x`, `x++`, `--x`, `x--`
    Update {
        target: Ident,
        op: UpdateOp,
        prefix: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl AssignOp {
    pub fn is_compound(self) -> bool {
        self != AssignOp::Assign
    }

    pub fn symbol(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Rem => "%=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    Var(Ident),
    Image(ImageRef),
}

impl AssignTarget {
    pub fn ident(&self) -> &Ident {
        match self {
            AssignTarget::Var(ident) => ident,
            AssignTarget::Image(image) => &image.image,
        }
    }
}

/// Values a `foreach` loop iterates over
#[derive(Debug, Clone, PartialEq)]
pub enum LoopSource {
    /// `{a, b, c}`
    List(Vec<Expr>),
    /// `lo:hi`, inclusive
    Range { lo: Box<Expr>, hi: Box<Expr> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub position: Position,
}

impl Stmt {
    pub fn new(kind: StmtKind, position: Position) -> Self {
        Self { kind, position }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Assign {
        target: AssignTarget,
        op: AssignOp,
        value: Expr,
    },
    Expr(Expr),
    Block(Vec<Stmt>),
    If {
        cond: Expr,
        then: Box<Stmt>,
        otherwise: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    Until {
        cond: Expr,
        body: Box<Stmt>,
    },
    Foreach {
        var: Ident,
        source: LoopSource,
        body: Box<Stmt>,
    },
    BreakIf(Expr),
    Break,
    Empty,
}
