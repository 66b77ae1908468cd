//! Recursive descent selector parser.
//!
//! Parses selector text into a [`SelectorList`]. Uses the logos-based tokenizer
//! from [`crate::selector::tokenizer`].

use logos::Logos;

use crate::selector::model::*;
use crate::selector::tokenizer::Token;

/// Errors from selector parsing.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParseError {
    #[error("invalid character at byte {0}")]
    InvalidCharacter(usize),
    #[error("unexpected token at position {position}: {message}")]
    UnexpectedToken { position: usize, message: String },
    #[error("unexpected end of input: {0}")]
    UnexpectedEof(String),
    #[error("empty selector")]
    Empty,
}

/// A positioned token with byte spans for whitespace detection.
#[derive(Debug, Clone)]
struct PToken {
    token: Token,
    text: String,
    /// Index in the token stream (for error reporting).
    pos: usize,
    byte_start: usize,
    byte_end: usize,
}

fn tokenize_with_spans(input: &str) -> Result<Vec<PToken>, ParseError> {
    Token::lexer(input)
        .spanned()
        .enumerate()
        .map(|(pos, (result, span))| {
            let token = result.map_err(|()| ParseError::InvalidCharacter(span.start))?;
            Ok(PToken {
                text: input[span.clone()].to_string(),
                token,
                pos,
                byte_start: span.start,
                byte_end: span.end,
            })
        })
        .collect()
}

/// Parse selector text such as `form > input[name=title], .summary`.
pub fn parse_selector(input: &str) -> Result<SelectorList, ParseError> {
    let tokens = tokenize_with_spans(input)?;
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut parser = Parser { tokens, cursor: 0 };
    let list = parser.parse_selector_list()?;

    match parser.peek() {
        Some(tok) => Err(ParseError::UnexpectedToken {
            position: tok.pos,
            message: format!("trailing {:?} '{}'", tok.token, tok.text),
        }),
        None => Ok(list),
    }
}

struct Parser {
    tokens: Vec<PToken>,
    cursor: usize,
}

impl Parser {
    fn peek(&self) -> Option<&PToken> {
        self.tokens.get(self.cursor)
    }

    fn advance(&mut self) -> Option<PToken> {
        let tok = self.tokens.get(self.cursor).cloned();
        if tok.is_some() {
            self.cursor += 1;
        }
        tok
    }

    fn current_pos(&self) -> usize {
        self.peek().map(|t| t.pos).unwrap_or(self.tokens.len())
    }

    /// Whether the current token directly follows the previous one (no whitespace).
    fn is_adjacent(&self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let prev = &self.tokens[self.cursor - 1];
        self.peek().is_some_and(|curr| curr.byte_start == prev.byte_end)
    }

    fn expect_ident(&mut self, what: &str) -> Result<String, ParseError> {
        let tok = self
            .advance()
            .ok_or_else(|| ParseError::UnexpectedEof(format!("expected {what}")))?;
        if tok.token != Token::Ident {
            return Err(ParseError::UnexpectedToken {
                position: tok.pos,
                message: format!("expected {what}, got {:?} '{}'", tok.token, tok.text),
            });
        }
        Ok(tok.text)
    }

    fn parse_selector_list(&mut self) -> Result<SelectorList, ParseError> {
        let mut selectors = vec![self.parse_complex()?];
        while self.peek().is_some_and(|t| t.token == Token::Comma) {
            self.advance();
            selectors.push(self.parse_complex()?);
        }
        Ok(SelectorList { selectors })
    }

    /// Parse compound selectors joined by combinators.
    fn parse_complex(&mut self) -> Result<Selector, ParseError> {
        let mut parts = vec![SelectorPart::Compound(self.parse_compound()?)];

        loop {
            match self.peek() {
                Some(t) if t.token == Token::GreaterThan => {
                    self.advance();
                    parts.push(SelectorPart::Combinator(Combinator::Child));
                    parts.push(SelectorPart::Compound(self.parse_compound()?));
                }
                // A selector-starting token the compound did not absorb was
                // separated by whitespace.
                Some(t)
                    if matches!(
                        t.token,
                        Token::Ident | Token::Hash | Token::Dot | Token::Star | Token::BracketOpen
                    ) =>
                {
                    parts.push(SelectorPart::Combinator(Combinator::Descendant));
                    parts.push(SelectorPart::Compound(self.parse_compound()?));
                }
                _ => break,
            }
        }

        Ok(Selector { parts })
    }

    fn parse_compound(&mut self) -> Result<CompoundSelector, ParseError> {
        let mut components = Vec::new();

        match self.peek().map(|t| t.token.clone()) {
            Some(Token::Ident) => {
                let name = self.expect_ident("tag name")?;
                components.push(SelectorComponent::Type(name.to_ascii_lowercase()));
            }
            Some(Token::Star) => {
                self.advance();
                components.push(SelectorComponent::Universal);
            }
            Some(Token::Dot | Token::Hash | Token::BracketOpen) => {
                components.push(self.parse_subclass()?);
            }
            Some(_) => {
                return Err(ParseError::UnexpectedToken {
                    position: self.current_pos(),
                    message: "expected selector part".into(),
                });
            }
            None => return Err(ParseError::UnexpectedEof("expected selector part".into())),
        }

        while self.is_adjacent()
            && self
                .peek()
                .is_some_and(|t| matches!(t.token, Token::Dot | Token::Hash | Token::BracketOpen))
        {
            components.push(self.parse_subclass()?);
        }

        Ok(CompoundSelector { components })
    }

    /// Parse `.class`, `#id` or `[attr(=value)?]`.
    fn parse_subclass(&mut self) -> Result<SelectorComponent, ParseError> {
        let tok = self
            .advance()
            .ok_or_else(|| ParseError::UnexpectedEof("expected selector part".into()))?;
        match tok.token {
            Token::Dot => Ok(SelectorComponent::Class(self.expect_ident("class name")?)),
            Token::Hash => Ok(SelectorComponent::Id(self.expect_ident("id")?)),
            Token::BracketOpen => {
                let name = self.expect_ident("attribute name")?;
                let value = if self.peek().is_some_and(|t| t.token == Token::Equals) {
                    self.advance();
                    Some(self.parse_attribute_value()?)
                } else {
                    None
                };
                match self.advance() {
                    Some(t) if t.token == Token::BracketClose => {
                        Ok(SelectorComponent::Attribute { name, value })
                    }
                    Some(t) => Err(ParseError::UnexpectedToken {
                        position: t.pos,
                        message: format!("expected ']', got {:?} '{}'", t.token, t.text),
                    }),
                    None => Err(ParseError::UnexpectedEof("expected ']'".into())),
                }
            }
            other => Err(ParseError::UnexpectedToken {
                position: tok.pos,
                message: format!("expected selector part, got {:?} '{}'", other, tok.text),
            }),
        }
    }

    fn parse_attribute_value(&mut self) -> Result<String, ParseError> {
        let tok = self
            .advance()
            .ok_or_else(|| ParseError::UnexpectedEof("expected attribute value".into()))?;
        match tok.token {
            Token::Ident => Ok(tok.text),
            Token::StringLiteral | Token::StringLiteralSingle => {
                Ok(tok.text[1..tok.text.len() - 1].to_string())
            }
            other => Err(ParseError::UnexpectedToken {
                position: tok.pos,
                message: format!("expected attribute value, got {:?} '{}'", other, tok.text),
            }),
        }
    }
}
