//! Selector AST: SelectorComponent, CompoundSelector, Selector, SelectorList.

/// A single simple selector.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorComponent {
    /// Tag selector, stored lower-case (e.g. `input`).
    Type(String),
    /// Universal selector: `*`.
    Universal,
    /// Class selector: `.classname`.
    Class(String),
    /// ID selector: `#id`.
    Id(String),
    /// Attribute selector: `[name]` or `[name=value]`.
    Attribute { name: String, value: Option<String> },
}

/// A combinator between compound selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Descendant combinator (whitespace): `A B`.
    Descendant,
    /// Child combinator: `A > B`.
    Child,
}

/// A sequence of simple selectors without combinators, e.g. `input.big[name]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompoundSelector {
    pub components: Vec<SelectorComponent>,
}

/// One element in a selector chain.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorPart {
    Compound(CompoundSelector),
    Combinator(Combinator),
}

/// A complex selector: compound selectors joined by combinators.
///
/// `form > input.big` has parts
/// `[Compound(form), Combinator(Child), Compound(input.big)]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selector {
    /// Alternating compounds and combinators, starting and ending with a compound.
    pub parts: Vec<SelectorPart>,
}

/// A comma-separated selector list. Matches when any member matches.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectorList {
    pub selectors: Vec<Selector>,
}
