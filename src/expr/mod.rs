//! Restricted expression language for template spans.
//!
//! - [`tokenizer`]: logos lexer
//! - [`parser`]: recursive descent parser producing an [`ast::Expr`]
//! - [`eval`]: interpreter over a [`Scope`] of bound values
//! - [`formatters`]: the built-in formatter set

pub mod ast;
pub mod eval;
pub mod formatters;
pub mod parser;
pub mod tokenizer;

pub use eval::{EvalError, Scope};
pub use formatters::{FormatterFn, FormatterRegistry};
pub use parser::{parse_expression, ParseError};

use crate::value::Value;

/// Any failure while turning expression source into a value.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ExprError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("evaluation error: {0}")]
    Eval(#[from] EvalError),
}

/// Parse and evaluate `source` in `scope`.
pub fn evaluate(source: &str, scope: &Scope<'_>) -> Result<Value, ExprError> {
    let expr = parse_expression(source)?;
    Ok(scope.eval(&expr)?)
}
