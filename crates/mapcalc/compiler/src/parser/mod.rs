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

//! Script parser
//!
//! A recursive-descent parser turning script text into an unannotated
//! [`Script`] tree. Operator precedence, lowest first:
//! `?:`, `||`, `^|`, `&&`, `== !=`, `< <= > >=`, `+ -`, `* / %`,
//! unary `- + !`, `^` (right associative), postfix `++ --`.

pub mod error;
pub mod lexer;
pub mod position;
pub mod token;

pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use position::Position;
pub use token::{Token, TokenKind};

use crate::ast::*;
use crate::catalog::options::OptionLiteral;

/// Parse a complete script
pub fn parse(source: &str) -> ParseResult<Script> {
    let tokens = lexer::tokenize(source)?;
    Parser::new(tokens).parse_script()
}

/// Parse a single expression (used by tests and tooling)
pub fn parse_expression(source: &str) -> ParseResult<Expr> {
    let tokens = lexer::tokenize(source)?;
    let mut parser = Parser::new(tokens);
    let expr = parser.expression()?;
    parser.expect(&TokenKind::Eof)?;
    Ok(expr)
}

/// Recursive-descent parser over a token vector
pub struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, cursor: 0 }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.cursor.min(self.tokens.len() - 1)]
    }

    fn peek_at(&self, offset: usize) -> &Token {
        &self.tokens[(self.cursor + offset).min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.cursor < self.tokens.len() - 1 {
            self.cursor += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.peek();
        let kind = if token.kind == TokenKind::Eof { ParseErrorKind::UnexpectedEof } else { ParseErrorKind::UnexpectedToken };
        ParseError::new(kind, token.position, format!("expected {expected}, found {}", token.kind))
    }

    fn expect(&mut self, kind: &TokenKind) -> ParseResult<Token> {
        if self.check(kind) { Ok(self.advance()) } else { Err(self.unexpected(&kind.to_string())) }
    }

    fn expect_ident(&mut self) -> ParseResult<(String, Position)> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Ident(name) => {
                self.advance();
                Ok((name, token.position))
            }
            _ => Err(self.unexpected("an identifier")),
        }
    }

    fn expect_word(&mut self, word: &str) -> ParseResult<Position> {
        if self.peek().is_word(word) { Ok(self.advance().position) } else { Err(self.unexpected(&format!("'{word}'"))) }
    }

    /// Parse sections and statements up to end of input
    pub fn parse_script(&mut self) -> ParseResult<Script> {
        let mut script = Script::default();
        while !self.check(&TokenKind::Eof) {
            let is_section = self.peek_at(1).kind == TokenKind::LeftBrace;
            if is_section && self.peek().is_word("options") {
                self.options_section(&mut script)?;
            } else if is_section && self.peek().is_word("images") {
                self.images_section(&mut script)?;
            } else if is_section && self.peek().is_word("init") {
                self.init_section(&mut script)?;
            } else {
                let stmt = self.statement()?;
                script.body.push(stmt);
            }
        }
        Ok(script)
    }

    fn options_section(&mut self, script: &mut Script) -> ParseResult<()> {
        self.advance();
        self.expect(&TokenKind::LeftBrace)?;
        while !self.eat(&TokenKind::RightBrace) {
            let (name, position) = self.expect_ident()?;
            self.expect(&TokenKind::Assign)?;
            let value = self.option_value()?;
            self.expect(&TokenKind::Semicolon)?;
            script.options.push(OptionEntry { name, value, position });
        }
        Ok(())
    }

    fn option_value(&mut self) -> ParseResult<OptionLiteral> {
        let negative = self.eat(&TokenKind::Minus);
        let token = self.advance();
        match token.kind {
            TokenKind::Number(n) => Ok(OptionLiteral::Number(if negative { -n } else { n })),
            TokenKind::Ident(word) if !negative => Ok(OptionLiteral::classify(&word)),
            _ => Err(ParseError::new(ParseErrorKind::InvalidSection, token.position, "option values must be a number, 'null' or a word")),
        }
    }

    fn images_section(&mut self, script: &mut Script) -> ParseResult<()> {
        self.advance();
        self.expect(&TokenKind::LeftBrace)?;
        while !self.eat(&TokenKind::RightBrace) {
            let (name, position) = self.expect_ident()?;
            self.expect(&TokenKind::Assign)?;
            let role_token = self.advance();
            let role = if role_token.is_word("read") {
                ImageRole::Source
            } else if role_token.is_word("write") {
                ImageRole::Destination
            } else {
                return Err(ParseError::new(ParseErrorKind::InvalidSection, role_token.position, "image role must be 'read' or 'write'"));
            };
            self.expect(&TokenKind::Semicolon)?;
            script.images.push(ImageDecl { name, role, position });
        }
        Ok(())
    }

    fn init_section(&mut self, script: &mut Script) -> ParseResult<()> {
        self.advance();
        self.expect(&TokenKind::LeftBrace)?;
        while !self.eat(&TokenKind::RightBrace) {
            let (name, position) = self.expect_ident()?;
            let value = if self.eat(&TokenKind::Assign) { Some(self.expression()?) } else { None };
            self.expect(&TokenKind::Semicolon)?;
            script.init.push(InitDecl {
                name: Ident::new(name, position),
                value,
            });
        }
        Ok(())
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        let position = self.peek().position;
        let followed_by_paren = self.peek_at(1).kind == TokenKind::LeftParen;

        if self.eat(&TokenKind::Semicolon) {
            return Ok(Stmt::new(StmtKind::Empty, position));
        }
        if self.eat(&TokenKind::LeftBrace) {
            let mut stmts = Vec::new();
            while !self.eat(&TokenKind::RightBrace) {
                if self.check(&TokenKind::Eof) {
                    return Err(self.unexpected("'}'"));
                }
                stmts.push(self.statement()?);
            }
            return Ok(Stmt::new(StmtKind::Block(stmts), position));
        }
        if followed_by_paren && self.peek().is_word("if") {
            self.advance();
            let cond = self.parenthesized()?;
            let then = Box::new(self.statement()?);
            let otherwise = if self.peek().is_word("else") {
                self.advance();
                Some(Box::new(self.statement()?))
            } else {
                None
            };
            return Ok(Stmt::new(StmtKind::If { cond, then, otherwise }, position));
        }
        if followed_by_paren && self.peek().is_word("while") {
            self.advance();
            let cond = self.parenthesized()?;
            let body = Box::new(self.statement()?);
            return Ok(Stmt::new(StmtKind::While { cond, body }, position));
        }
        if followed_by_paren && self.peek().is_word("until") {
            self.advance();
            let cond = self.parenthesized()?;
            let body = Box::new(self.statement()?);
            return Ok(Stmt::new(StmtKind::Until { cond, body }, position));
        }
        if followed_by_paren && self.peek().is_word("foreach") {
            return self.foreach(position);
        }
        if followed_by_paren && self.peek().is_word("breakif") {
            self.advance();
            let cond = self.parenthesized()?;
            self.expect(&TokenKind::Semicolon)?;
            return Ok(Stmt::new(StmtKind::BreakIf(cond), position));
        }
        if self.peek().is_word("break") && self.peek_at(1).kind == TokenKind::Semicolon {
            self.advance();
            self.advance();
            return Ok(Stmt::new(StmtKind::Break, position));
        }

        let expr = self.expression()?;
        if let Some(op) = self.assign_op() {
            let op_token = self.advance();
            let target = match expr.kind {
                ExprKind::Var(ident) => AssignTarget::Var(ident),
                ExprKind::Image(image) => AssignTarget::Image(image),
                _ => {
                    return Err(ParseError::new(
                        ParseErrorKind::InvalidAssignmentTarget,
                        op_token.position,
                        format!("cannot assign with '{}' to this expression", op.symbol()),
                    ));
                }
            };
            let value = self.expression()?;
            self.expect(&TokenKind::Semicolon)?;
            return Ok(Stmt::new(StmtKind::Assign { target, op, value }, position));
        }
        self.expect(&TokenKind::Semicolon)?;
        Ok(Stmt::new(StmtKind::Expr(expr), position))
    }

    fn assign_op(&self) -> Option<AssignOp> {
        match self.peek().kind {
            TokenKind::Assign => Some(AssignOp::Assign),
            TokenKind::PlusAssign => Some(AssignOp::Add),
            TokenKind::MinusAssign => Some(AssignOp::Sub),
            TokenKind::StarAssign => Some(AssignOp::Mul),
            TokenKind::SlashAssign => Some(AssignOp::Div),
            TokenKind::PercentAssign => Some(AssignOp::Rem),
            _ => None,
        }
    }

    fn parenthesized(&mut self) -> ParseResult<Expr> {
        self.expect(&TokenKind::LeftParen)?;
        let expr = self.expression()?;
        self.expect(&TokenKind::RightParen)?;
        Ok(expr)
    }

    fn foreach(&mut self, position: Position) -> ParseResult<Stmt> {
        self.advance();
        self.expect(&TokenKind::LeftParen)?;
        let (name, var_position) = self.expect_ident()?;
        self.expect_word("in")?;
        let source = if self.eat(&TokenKind::LeftBrace) {
            let mut items = vec![self.expression()?];
            while self.eat(&TokenKind::Comma) {
                items.push(self.expression()?);
            }
            self.expect(&TokenKind::RightBrace)?;
            LoopSource::List(items)
        } else {
            let lo = self.expression()?;
            self.expect(&TokenKind::Colon)?;
            let hi = self.expression()?;
            LoopSource::Range {
                lo: Box::new(lo),
                hi: Box::new(hi),
            }
        };
        self.expect(&TokenKind::RightParen)?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::new(
            StmtKind::Foreach {
                var: Ident::new(name, var_position),
                source,
                body,
            },
            position,
        ))
    }

    /// Parse an expression
    pub fn expression(&mut self) -> ParseResult<Expr> {
        self.ternary()
    }

    fn ternary(&mut self) -> ParseResult<Expr> {
        let cond = self.binary_level(0)?;
        if self.check(&TokenKind::Question) {
            let position = self.advance().position;
            let then = self.expression()?;
            self.expect(&TokenKind::Colon)?;
            let otherwise = self.expression()?;
            return Ok(Expr::new(
                ExprKind::Ternary {
                    cond: Box::new(cond),
                    then: Box::new(then),
                    otherwise: Box::new(otherwise),
                },
                position,
            ));
        }
        Ok(cond)
    }

    /// Number of binary precedence levels below the ternary operator
    const BINARY_LEVELS: usize = 7;

    /// Binary operator for `kind` at precedence `level`, lowest first
    fn binary_op(level: usize, kind: &TokenKind) -> Option<BinaryOp> {
        match (level, kind) {
            (0, TokenKind::OrOr) => Some(BinaryOp::Or),
            (1, TokenKind::XorXor) => Some(BinaryOp::Xor),
            (2, TokenKind::AndAnd) => Some(BinaryOp::And),
            (3, TokenKind::EqualEqual) => Some(BinaryOp::Eq),
            (3, TokenKind::BangEqual) => Some(BinaryOp::Ne),
            (4, TokenKind::Less) => Some(BinaryOp::Lt),
            (4, TokenKind::LessEqual) => Some(BinaryOp::Le),
            (4, TokenKind::Greater) => Some(BinaryOp::Gt),
            (4, TokenKind::GreaterEqual) => Some(BinaryOp::Ge),
            (5, TokenKind::Plus) => Some(BinaryOp::Add),
            (5, TokenKind::Minus) => Some(BinaryOp::Sub),
            (6, TokenKind::Star) => Some(BinaryOp::Mul),
            (6, TokenKind::Slash) => Some(BinaryOp::Div),
            (6, TokenKind::Percent) => Some(BinaryOp::Rem),
            _ => None,
        }
    }

    fn binary_level(&mut self, level: usize) -> ParseResult<Expr> {
        if level == Self::BINARY_LEVELS {
            return self.unary();
        }
        let mut lhs = self.binary_level(level + 1)?;
        loop {
            let Some(op) = Self::binary_op(level, &self.peek().kind) else {
                break;
            };
            let position = self.advance().position;
            let rhs = self.binary_level(level + 1)?;
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                position,
            );
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        let position = self.peek().position;
        let op = match self.peek().kind {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Bang => Some(UnaryOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.unary()?;
            return Ok(Expr::new(ExprKind::Unary { op, operand: Box::new(operand) }, position));
        }
        if matches!(self.peek().kind, TokenKind::PlusPlus | TokenKind::MinusMinus) {
            let op = if self.advance().kind == TokenKind::PlusPlus { UpdateOp::Increment } else { UpdateOp::Decrement };
            let (name, name_position) = self.expect_ident()?;
            return Ok(Expr::new(
                ExprKind::Update {
                    target: Ident::new(name, name_position),
                    op,
                    prefix: true,
                },
                position,
            ));
        }
        self.power()
    }

    fn power(&mut self) -> ParseResult<Expr> {
        let base = self.postfix()?;
        if self.check(&TokenKind::Caret) {
            let position = self.advance().position;
            let exponent = self.unary()?;
            return Ok(Expr::new(
                ExprKind::Binary {
                    op: BinaryOp::Pow,
                    lhs: Box::new(base),
                    rhs: Box::new(exponent),
                },
                position,
            ));
        }
        Ok(base)
    }

    fn postfix(&mut self) -> ParseResult<Expr> {
        let expr = self.primary()?;
        let op = match self.peek().kind {
            TokenKind::PlusPlus => UpdateOp::Increment,
            TokenKind::MinusMinus => UpdateOp::Decrement,
            _ => return Ok(expr),
        };
        let op_position = self.advance().position;
        match expr.kind {
            ExprKind::Var(target) => Ok(Expr::new(ExprKind::Update { target, op, prefix: false }, expr.position)),
            _ => Err(ParseError::new(ParseErrorKind::InvalidAssignmentTarget, op_position, "'++'/'--' apply only to variables")),
        }
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::number(n, token.position))
            }
            TokenKind::LeftParen => self.parenthesized(),
            TokenKind::Ident(name) => {
                self.advance();
                if self.eat(&TokenKind::LeftParen) {
                    let mut args = Vec::new();
                    if !self.eat(&TokenKind::RightParen) {
                        args.push(self.expression()?);
                        while self.eat(&TokenKind::Comma) {
                            args.push(self.expression()?);
                        }
                        self.expect(&TokenKind::RightParen)?;
                    }
                    return Ok(Expr::new(ExprKind::Call { name, args, resolved: None }, token.position));
                }
                if self.check(&TokenKind::LeftBracket) {
                    return self.image_ref(Ident::new(name, token.position));
                }
                Ok(Expr::var(name, token.position))
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    /// `img[band]`, `img[x, y]` or `img[band][x, y]`
    fn image_ref(&mut self, image: Ident) -> ParseResult<Expr> {
        let position = image.position;
        self.expect(&TokenKind::LeftBracket)?;
        let first = self.coord()?;
        let mut band = None;
        let mut pixel = None;
        if self.eat(&TokenKind::Comma) {
            let y = self.coord()?;
            self.expect(&TokenKind::RightBracket)?;
            pixel = Some(PixelRef { x: first, y });
        } else {
            self.expect(&TokenKind::RightBracket)?;
            band = Some(match first {
                Coord::Relative(expr) => expr,
                Coord::Absolute(expr) => {
                    return Err(ParseError::new(ParseErrorKind::UnexpectedToken, expr.position, "'$' is only allowed in pixel positions"));
                }
            });
            if self.eat(&TokenKind::LeftBracket) {
                let x = self.coord()?;
                self.expect(&TokenKind::Comma)?;
                let y = self.coord()?;
                self.expect(&TokenKind::RightBracket)?;
                pixel = Some(PixelRef { x, y });
            }
        }
        Ok(Expr::new(ExprKind::Image(ImageRef { image, band, pixel }), position))
    }

    fn coord(&mut self) -> ParseResult<Coord> {
        if self.eat(&TokenKind::Dollar) {
            Ok(Coord::Absolute(Box::new(self.expression()?)))
        } else {
            Ok(Coord::Relative(Box::new(self.expression()?)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary(expr: &Expr) -> (BinaryOp, &Expr, &Expr) {
        match &expr.kind {
            ExprKind::Binary { op, lhs, rhs } => (*op, lhs, rhs),
            other => panic!("expected binary expression, got {other:?}"),
        }
    }

    #[test]
    fn test_precedence() {
        let expr = parse_expression("1 + 2 * 3 > 4 && 5").unwrap();
        let (op, lhs, _) = binary(&expr);
        assert_eq!(op, BinaryOp::And);
        let (op, lhs, _) = binary(lhs);
        assert_eq!(op, BinaryOp::Gt);
        let (op, _, rhs) = binary(lhs);
        assert_eq!(op, BinaryOp::Add);
        assert_eq!(binary(rhs).0, BinaryOp::Mul);
    }

    #[test]
    fn test_power_is_right_associative() {
        let expr = parse_expression("2 ^ 3 ^ 2").unwrap();
        let (op, lhs, rhs) = binary(&expr);
        assert_eq!(op, BinaryOp::Pow);
        assert_eq!(lhs.kind, ExprKind::Number(2.0));
        assert_eq!(binary(rhs).0, BinaryOp::Pow);
    }

    #[test]
    fn test_image_references() {
        let expr = parse_expression("src[1][-1, $2]").unwrap();
        let ExprKind::Image(image) = expr.kind else { panic!("expected image reference") };
        assert_eq!(image.image.name, "src");
        assert!(image.band.is_some());
        let pixel = image.pixel.unwrap();
        assert!(matches!(pixel.x, Coord::Relative(_)));
        assert!(matches!(pixel.y, Coord::Absolute(_)));

        let expr = parse_expression("src[0, 1]").unwrap();
        let ExprKind::Image(image) = expr.kind else { panic!("expected image reference") };
        assert!(image.band.is_none());
        assert!(image.pixel.is_some());
    }

    #[test]
    fn test_sections_and_statements() {
        let script = parse(
            "options { outside = -1; }
             images { src = read; dest = write; }
             init { n = 0; total; }
             if (src > 0) { dest = n++; } else dest = 0;
             foreach (i in {1, 2, 3}) { total += i; }
             foreach (k in 1:10) breakif(k > 5);",
        )
        .unwrap();
        assert_eq!(script.options.len(), 1);
        assert_eq!(script.options[0].value, OptionLiteral::Number(-1.0));
        assert_eq!(script.images.len(), 2);
        assert_eq!(script.images[1].role, ImageRole::Destination);
        assert_eq!(script.init.len(), 2);
        assert!(script.init[1].value.is_none());
        assert_eq!(script.body.len(), 3);
        assert!(matches!(script.body[0].kind, StmtKind::If { otherwise: Some(_), .. }));
        assert!(matches!(&script.body[2].kind, StmtKind::Foreach { source: LoopSource::Range { .. }, .. }));
    }

    #[test]
    fn test_update_expressions() {
        let script = parse("dest = n++; m = --n;").unwrap();
        let StmtKind::Assign { value, .. } = &script.body[0].kind else { panic!("expected assignment") };
        assert!(matches!(value.kind, ExprKind::Update { prefix: false, op: UpdateOp::Increment, .. }));
        let StmtKind::Assign { value, .. } = &script.body[1].kind else { panic!("expected assignment") };
        assert!(matches!(value.kind, ExprKind::Update { prefix: true, op: UpdateOp::Decrement, .. }));
    }

    #[test]
    fn test_if_function_is_an_expression() {
        let script = parse("dest = if(src, 1, 2);").unwrap();
        let StmtKind::Assign { value, .. } = &script.body[0].kind else { panic!("expected assignment") };
        assert!(matches!(&value.kind, ExprKind::Call { name, args, .. } if name == "if" && args.len() == 3));
    }

    #[test]
    fn test_syntax_errors() {
        let err = parse("dest = ;").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedToken);

        let err = parse("1 + 2 = 3;").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidAssignmentTarget);

        let err = parse("dest = src").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEof);

        let err = parse("images { src = sideways; }").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidSection);
    }
}
