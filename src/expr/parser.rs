//! Recursive descent expression parser.
//!
//! Precedence, loosest first: `?:`, `||` / `??`, `&&`, equality, relational,
//! additive, multiplicative, unary, postfix (call, member, index), primary.

use crate::expr::ast::{BinaryOp, Expr, LogicalOp, UnaryOp};
use crate::expr::tokenizer::{tokenize, Spanned, Token};
use crate::value::Value;

/// Deepest nesting accepted: parenthesised groups, unary chains, operator
/// chains and postfix chains all count.
pub const MAX_DEPTH: usize = 128;

/// Errors from expression parsing.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParseError {
    #[error("invalid character at offset {0}")]
    InvalidToken(usize),
    #[error("unexpected token at offset {offset}: {message}")]
    UnexpectedToken { offset: usize, message: String },
    #[error("unexpected end of expression: {0}")]
    UnexpectedEof(String),
    #[error("empty expression")]
    Empty,
    #[error("expression nested deeper than {0} levels")]
    TooDeep(usize),
}

/// Parse a single expression. The whole input must be consumed.
pub fn parse_expression(input: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(input).map_err(ParseError::InvalidToken)?;
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut parser = Parser {
        tokens,
        cursor: 0,
        depth: 0,
    };
    let expr = parser.parse_conditional()?;

    match parser.peek() {
        Some(tok) => Err(ParseError::UnexpectedToken {
            offset: tok.offset,
            message: format!("trailing '{}'", tok.text),
        }),
        None => Ok(expr),
    }
}

struct Parser {
    tokens: Vec<Spanned>,
    cursor: usize,
    depth: usize,
}

impl Parser {
    /// Descend one level. Returns the depth to restore on the way out.
    fn enter(&mut self) -> Result<usize, ParseError> {
        let outer = self.depth;
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ParseError::TooDeep(MAX_DEPTH));
        }
        Ok(outer)
    }

    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.cursor)
    }

    fn peek_token(&self) -> Option<&Token> {
        self.peek().map(|s| &s.token)
    }

    fn advance(&mut self) -> Option<Spanned> {
        let tok = self.tokens.get(self.cursor).cloned();
        if tok.is_some() {
            self.cursor += 1;
        }
        tok
    }

    /// Consume the next token if it is `expected`.
    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek_token() == Some(expected) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token, what: &str) -> Result<(), ParseError> {
        match self.advance() {
            Some(tok) if &tok.token == expected => Ok(()),
            Some(tok) => Err(ParseError::UnexpectedToken {
                offset: tok.offset,
                message: format!("expected {what}, got '{}'", tok.text),
            }),
            None => Err(ParseError::UnexpectedEof(format!("expected {what}"))),
        }
    }

    fn parse_conditional(&mut self) -> Result<Expr, ParseError> {
        let outer = self.enter()?;
        let test = self.parse_or()?;
        if !self.eat(&Token::Question) {
            self.depth = outer;
            return Ok(test);
        }
        let consequent = self.parse_conditional()?;
        self.expect(&Token::Colon, "':'")?;
        let alternate = self.parse_conditional()?;
        self.depth = outer;
        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let outer = self.depth;
        let mut left = self.parse_and()?;
        loop {
            let op = match self.peek_token() {
                Some(Token::Or) => LogicalOp::Or,
                Some(Token::Nullish) => LogicalOp::Nullish,
                _ => {
                    self.depth = outer;
                    return Ok(left);
                }
            };
            self.advance();
            self.enter()?;
            let right = self.parse_and()?;
            left = Expr::Logical {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let outer = self.depth;
        let mut left = self.parse_equality()?;
        while self.eat(&Token::And) {
            self.enter()?;
            let right = self.parse_equality()?;
            left = Expr::Logical {
                op: LogicalOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.depth = outer;
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(Self::parse_relational, |token| match token {
            Token::Eq => Some(BinaryOp::Eq),
            Token::NotEq => Some(BinaryOp::NotEq),
            Token::StrictEq => Some(BinaryOp::StrictEq),
            Token::StrictNotEq => Some(BinaryOp::StrictNotEq),
            _ => None,
        })
    }

    fn parse_relational(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(Self::parse_additive, |token| match token {
            Token::Less => Some(BinaryOp::Less),
            Token::LessEq => Some(BinaryOp::LessEq),
            Token::Greater => Some(BinaryOp::Greater),
            Token::GreaterEq => Some(BinaryOp::GreaterEq),
            _ => None,
        })
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(Self::parse_multiplicative, |token| match token {
            Token::Plus => Some(BinaryOp::Add),
            Token::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(Self::parse_unary, |token| match token {
            Token::Star => Some(BinaryOp::Mul),
            Token::Slash => Some(BinaryOp::Div),
            Token::Percent => Some(BinaryOp::Rem),
            _ => None,
        })
    }

    /// Left-associative binary level: `next (op next)*`.
    fn parse_binary_level(
        &mut self,
        next: fn(&mut Self) -> Result<Expr, ParseError>,
        operator: fn(&Token) -> Option<BinaryOp>,
    ) -> Result<Expr, ParseError> {
        let outer = self.depth;
        let mut left = next(self)?;
        while let Some(op) = self.peek_token().and_then(operator) {
            self.advance();
            self.enter()?;
            let right = next(self)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.depth = outer;
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek_token() {
            Some(Token::Bang) => UnaryOp::Not,
            Some(Token::Minus) => UnaryOp::Negate,
            Some(Token::Plus) => UnaryOp::Plus,
            _ => return self.parse_postfix(),
        };
        self.advance();
        let outer = self.enter()?;
        let operand = self.parse_unary()?;
        self.depth = outer;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let outer = self.depth;
        let mut expr = self.parse_primary()?;
        loop {
            if matches!(
                self.peek_token(),
                Some(Token::Dot | Token::BracketOpen | Token::ParenOpen)
            ) {
                self.enter()?;
            }
            match self.peek_token() {
                Some(Token::Dot) => {
                    self.advance();
                    let name = self.advance().ok_or_else(|| {
                        ParseError::UnexpectedEof("expected property name after '.'".into())
                    })?;
                    if !is_property_name(&name.token) {
                        return Err(ParseError::UnexpectedToken {
                            offset: name.offset,
                            message: format!("expected property name, got '{}'", name.text),
                        });
                    }
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property: name.text,
                    };
                }
                Some(Token::BracketOpen) => {
                    self.advance();
                    let index = self.parse_conditional()?;
                    self.expect(&Token::BracketClose, "']'")?;
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                Some(Token::ParenOpen) => {
                    self.advance();
                    let args = self.parse_list(&Token::ParenClose, "')'")?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                    };
                }
                _ => {
                    self.depth = outer;
                    return Ok(expr);
                }
            }
        }
    }

    /// Parse comma-separated expressions up to and including `close`.
    /// A trailing comma is allowed.
    fn parse_list(&mut self, close: &Token, what: &str) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        loop {
            if self.eat(close) {
                return Ok(items);
            }
            items.push(self.parse_conditional()?);
            if !self.eat(&Token::Comma) {
                self.expect(close, what)?;
                return Ok(items);
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let tok = self
            .advance()
            .ok_or_else(|| ParseError::UnexpectedEof("expected operand".into()))?;

        match tok.token {
            Token::True => Ok(Expr::Literal(Value::Bool(true))),
            Token::False => Ok(Expr::Literal(Value::Bool(false))),
            Token::Null => Ok(Expr::Literal(Value::Null)),
            Token::Undefined => Ok(Expr::Literal(Value::Undefined)),
            Token::Number => {
                let n: f64 = tok.text.parse().map_err(|_| ParseError::UnexpectedToken {
                    offset: tok.offset,
                    message: format!("invalid number: {}", tok.text),
                })?;
                Ok(Expr::Literal(Value::Number(n)))
            }
            Token::StringDouble | Token::StringSingle => {
                let inner = &tok.text[1..tok.text.len() - 1];
                Ok(Expr::Literal(Value::String(unescape(inner))))
            }
            Token::Ident => Ok(Expr::Ident(tok.text)),
            Token::ParenOpen => {
                let inner = self.parse_conditional()?;
                self.expect(&Token::ParenClose, "')'")?;
                Ok(inner)
            }
            Token::BracketOpen => Ok(Expr::Array(self.parse_list(&Token::BracketClose, "']'")?)),
            _ => Err(ParseError::UnexpectedToken {
                offset: tok.offset,
                message: format!("expected operand, got '{}'", tok.text),
            }),
        }
    }
}

/// Identifiers and keywords are both valid after `.` (`a.null` is legal).
fn is_property_name(token: &Token) -> bool {
    matches!(
        token,
        Token::Ident | Token::True | Token::False | Token::Null | Token::Undefined
    )
}

/// Resolve backslash escapes inside a string literal body.
fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
