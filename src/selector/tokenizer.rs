//! logos-based selector tokenizer.
//!
//! Whitespace is skipped; the parser recovers descendant combinators from the
//! byte gaps between token spans.

use logos::Logos;

/// Selector token produced by the lexer.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")]
pub enum Token {
    /// Double-quoted string literal (attribute values).
    #[regex(r#""[^"]*""#)]
    StringLiteral,

    /// Single-quoted string literal (attribute values).
    #[regex(r"'[^']*'")]
    StringLiteralSingle,

    /// Name: tag, class, id, attribute name or unquoted attribute value.
    #[regex(r"[a-zA-Z0-9_-]+")]
    Ident,

    /// `[`
    #[token("[")]
    BracketOpen,

    /// `]`
    #[token("]")]
    BracketClose,

    /// `=`
    #[token("=")]
    Equals,

    /// `,`
    #[token(",")]
    Comma,

    /// `.`
    #[token(".")]
    Dot,

    /// `#`
    #[token("#")]
    Hash,

    /// `*`
    #[token("*")]
    Star,

    /// `>`
    #[token(">")]
    GreaterThan,
}

/// Tokenize a selector string into `(Token, text)` pairs, dropping lex errors.
pub fn tokenize(input: &str) -> Vec<(Token, String)> {
    Token::lexer(input)
        .spanned()
        .filter_map(|(result, span)| result.ok().map(|token| (token, input[span].to_string())))
        .collect()
}
