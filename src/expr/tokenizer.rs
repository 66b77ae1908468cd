//! logos-based expression tokenizer.
//!
//! Token priority in logos is determined by:
//! 1. Longest match wins (e.g. `===` beats `==` beats `=`-less prefixes)
//! 2. Literal `#[token]`s beat `#[regex]`es of equal length, so `true` is a
//!    keyword rather than an identifier

use logos::Logos;

/// Expression token produced by the lexer.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")]
pub enum Token {
    // ── Keywords ─────────────────────────────────────────────────────

    #[token("true")]
    True,

    #[token("false")]
    False,

    #[token("null")]
    Null,

    #[token("undefined")]
    Undefined,

    // ── Literals and names ───────────────────────────────────────────

    /// Decimal number with optional fraction and exponent.
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?")]
    Number,

    /// Double-quoted string with backslash escapes.
    #[regex(r#""([^"\\]|\\.)*""#)]
    StringDouble,

    /// Single-quoted string with backslash escapes.
    #[regex(r"'([^'\\]|\\.)*'")]
    StringSingle,

    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*")]
    Ident,

    // ── Operators ────────────────────────────────────────────────────

    #[token("===")]
    StrictEq,

    #[token("!==")]
    StrictNotEq,

    #[token("==")]
    Eq,

    #[token("!=")]
    NotEq,

    #[token("<=")]
    LessEq,

    #[token(">=")]
    GreaterEq,

    #[token("&&")]
    And,

    #[token("||")]
    Or,

    #[token("??")]
    Nullish,

    #[token("<")]
    Less,

    #[token(">")]
    Greater,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("%")]
    Percent,

    #[token("!")]
    Bang,

    #[token("?")]
    Question,

    #[token(":")]
    Colon,

    // ── Punctuation ──────────────────────────────────────────────────

    #[token(".")]
    Dot,

    #[token(",")]
    Comma,

    #[token("(")]
    ParenOpen,

    #[token(")")]
    ParenClose,

    #[token("[")]
    BracketOpen,

    #[token("]")]
    BracketClose,
}

/// A token with its source text and byte offset.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub text: String,
    pub offset: usize,
}

/// Tokenize expression source. Fails with the byte offset of the first
/// character that does not start any token.
pub fn tokenize(input: &str) -> Result<Vec<Spanned>, usize> {
    Token::lexer(input)
        .spanned()
        .map(|(result, span)| match result {
            Ok(token) => Ok(Spanned {
                token,
                text: input[span.clone()].to_string(),
                offset: span.start,
            }),
            Err(()) => Err(span.start),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        tokenize(input)
            .unwrap_or_else(|offset| panic!("lex error at {offset}"))
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn test_keywords_beat_identifiers() {
        assert_eq!(
            tokens("true false null undefined truthy"),
            vec![
                Token::True,
                Token::False,
                Token::Null,
                Token::Undefined,
                Token::Ident
            ]
        );
    }

    #[test]
    fn test_longest_operator_wins() {
        assert_eq!(
            tokens("=== !== == != <= >= && || ?? < >"),
            vec![
                Token::StrictEq,
                Token::StrictNotEq,
                Token::Eq,
                Token::NotEq,
                Token::LessEq,
                Token::GreaterEq,
                Token::And,
                Token::Or,
                Token::Nullish,
                Token::Less,
                Token::Greater,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let result = tokenize("10 3.25 1e3").unwrap();
        let texts: Vec<_> = result.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["10", "3.25", "1e3"]);
        assert!(result.iter().all(|s| s.token == Token::Number));
    }

    #[test]
    fn test_strings_with_escapes() {
        let result = tokenize(r#""a \"b\"" 'it\'s'"#).unwrap();
        assert_eq!(result[0].token, Token::StringDouble);
        assert_eq!(result[0].text, r#""a \"b\"""#);
        assert_eq!(result[1].token, Token::StringSingle);
    }

    #[test]
    fn test_call_expression() {
        assert_eq!(
            tokens("upperCase(user.name)"),
            vec![
                Token::Ident,
                Token::ParenOpen,
                Token::Ident,
                Token::Dot,
                Token::Ident,
                Token::ParenClose,
            ]
        );
    }

    #[test]
    fn test_lex_error_reports_offset() {
        assert_eq!(tokenize("a = b"), Err(2));
        assert_eq!(tokenize("#x"), Err(0));
    }

    #[test]
    fn test_whitespace_and_newlines_skipped() {
        assert_eq!(tokens(" a\n +\t1 "), vec![Token::Ident, Token::Plus, Token::Number]);
    }
}
