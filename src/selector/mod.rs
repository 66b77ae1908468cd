//! Selector engine: tokenizer, parser and matcher for element queries.

pub mod matcher;
pub mod model;
pub mod parser;
pub mod tokenizer;

pub use model::{Combinator, CompoundSelector, Selector, SelectorComponent, SelectorList};
pub use parser::{parse_selector, ParseError};
