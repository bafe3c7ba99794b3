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

//! Script lexical analyzer (tokenizer)

use super::error::{ParseError, ParseErrorKind, ParseResult};
use super::position::Position;
use super::token::{Token, TokenKind};
use std::iter::Peekable;
use std::str::Chars;

/// Script lexical analyzer
pub struct Lexer<'src> {
    chars: Peekable<Chars<'src>>,
    position: Position,
}

impl<'src> Lexer<'src> {
    /// Create a lexer over the given source
    pub fn new(source: &'src str) -> Self {
        Self {
            chars: source.chars().peekable(),
            position: Position::start(),
        }
    }

    /// Tokenize the entire input; the last token is always `Eof`
    pub fn tokenize(mut self) -> ParseResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        self.position.advance(ch);
        Some(ch)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Skip whitespace and comments
    fn skip_trivia(&mut self) -> ParseResult<()> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    match lookahead.next() {
                        Some('/') => {
                            while let Some(c) = self.bump() {
                                if c == '\n' {
                                    break;
                                }
                            }
                        }
                        Some('*') => {
                            let start = self.position;
                            self.bump();
                            self.bump();
                            let mut closed = false;
                            while let Some(c) = self.bump() {
                                if c == '*' && self.eat('/') {
                                    closed = true;
                                    break;
                                }
                            }
                            if !closed {
                                return Err(ParseError::new(ParseErrorKind::UnterminatedComment, start, "block comment is never closed"));
                            }
                        }
                        _ => return Ok(()),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn next_token(&mut self) -> ParseResult<Token> {
        self.skip_trivia()?;
        let start = self.position;
        let Some(ch) = self.bump() else {
            return Ok(Token::new(TokenKind::Eof, start));
        };

        let kind = match ch {
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '?' => TokenKind::Question,
            '$' => TokenKind::Dollar,
            '+' => {
                if self.eat('+') {
                    TokenKind::PlusPlus
                } else if self.eat('=') {
                    TokenKind::PlusAssign
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.eat('-') {
                    TokenKind::MinusMinus
                } else if self.eat('=') {
                    TokenKind::MinusAssign
                } else {
                    TokenKind::Minus
                }
            }
            '*' => if self.eat('=') { TokenKind::StarAssign } else { TokenKind::Star },
            '/' => if self.eat('=') { TokenKind::SlashAssign } else { TokenKind::Slash },
            '%' => if self.eat('=') { TokenKind::PercentAssign } else { TokenKind::Percent },
            '^' => if self.eat('|') { TokenKind::XorXor } else { TokenKind::Caret },
            '=' => if self.eat('=') { TokenKind::EqualEqual } else { TokenKind::Assign },
            '!' => if self.eat('=') { TokenKind::BangEqual } else { TokenKind::Bang },
            '<' => if self.eat('=') { TokenKind::LessEqual } else { TokenKind::Less },
            '>' => if self.eat('=') { TokenKind::GreaterEqual } else { TokenKind::Greater },
            '&' => {
                if self.eat('&') {
                    TokenKind::AndAnd
                } else {
                    return Err(ParseError::new(ParseErrorKind::InvalidCharacter, start, "expected '&&'"));
                }
            }
            '|' => {
                if self.eat('|') {
                    TokenKind::OrOr
                } else {
                    return Err(ParseError::new(ParseErrorKind::InvalidCharacter, start, "expected '||'"));
                }
            }
            c if c.is_ascii_digit() || c == '.' => self.scan_number(c, start)?,
            c if c.is_alphabetic() || c == '_' => self.scan_identifier(c),
            c => return Err(ParseError::new(ParseErrorKind::InvalidCharacter, start, format!("unexpected character '{c}'"))),
        };

        Ok(Token::new(kind, start))
    }

    fn scan_number(&mut self, first: char, start: Position) -> ParseResult<TokenKind> {
        let mut text = String::from(first);
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '.' {
                text.push(c);
                self.bump();
            } else if c == 'e' || c == 'E' {
                text.push(c);
                self.bump();
                if let Some(sign) = self.peek().filter(|s| *s == '+' || *s == '-') {
                    text.push(sign);
                    self.bump();
                }
            } else {
                break;
            }
        }
        text.parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| ParseError::new(ParseErrorKind::InvalidNumber, start, format!("'{text}' is not a valid number")))
    }

    fn scan_identifier(&mut self, first: char) -> TokenKind {
        let mut text = String::from(first);
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        TokenKind::Ident(text)
    }
}

/// Tokenize a script
pub fn tokenize(source: &str) -> ParseResult<Vec<Token>> {
    Lexer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("a += b++ ^| !c >= 2"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::PlusAssign,
                TokenKind::Ident("b".into()),
                TokenKind::PlusPlus,
                TokenKind::XorXor,
                TokenKind::Bang,
                TokenKind::Ident("c".into()),
                TokenKind::GreaterEqual,
                TokenKind::Number(2.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("1.5 .25 2e3 4E-1"), vec![
            TokenKind::Number(1.5),
            TokenKind::Number(0.25),
            TokenKind::Number(2000.0),
            TokenKind::Number(0.4),
            TokenKind::Eof
        ]);
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(kinds("a // note\n /* block\n */ b"), vec![TokenKind::Ident("a".into()), TokenKind::Ident("b".into()), TokenKind::Eof]);
    }

    #[test]
    fn test_positions() {
        let tokens = tokenize("x\n  y").unwrap();
        assert_eq!(tokens[1].position, Position::new(2, 3));
    }

    #[test]
    fn test_errors() {
        let err = tokenize("a # b").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidCharacter);
        assert_eq!(err.position, Position::new(1, 3));

        let err = tokenize("/* open").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedComment);

        let err = tokenize("1.2.3").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidNumber);
    }
}
