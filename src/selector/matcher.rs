//! Selector matching against the element tree.

use crate::dom::node::{ElementData, NodeId};
use crate::dom::tree::Dom;
use crate::selector::model::{
    Combinator, CompoundSelector, Selector, SelectorComponent, SelectorList, SelectorPart,
};

/// Whether any selector in the list matches `node_id`.
pub fn matches_list(list: &SelectorList, node_id: NodeId, dom: &Dom) -> bool {
    list.selectors
        .iter()
        .any(|selector| matches_selector(selector, node_id, dom))
}

/// Check whether a complex selector matches a given element.
///
/// Walks the parts from right to left, navigating ancestors via combinators.
/// Ancestors outside any query root still count, like `querySelectorAll`.
pub fn matches_selector(selector: &Selector, node_id: NodeId, dom: &Dom) -> bool {
    let parts = &selector.parts;
    let Some(SelectorPart::Compound(last)) = parts.last() else {
        return false;
    };
    if !dom.get(node_id).is_some_and(|node| matches_compound(last, node)) {
        return false;
    }

    let mut part_idx = parts.len() - 1;
    let mut current_node = node_id;

    while part_idx > 0 {
        let SelectorPart::Combinator(combinator) = &parts[part_idx - 1] else {
            return false;
        };
        if part_idx < 2 {
            return false;
        }
        let SelectorPart::Compound(compound) = &parts[part_idx - 2] else {
            return false;
        };
        part_idx -= 2;

        match combinator {
            Combinator::Child => {
                let Some(parent_id) = dom.parent(current_node) else {
                    return false;
                };
                if !dom.get(parent_id).is_some_and(|p| matches_compound(compound, p)) {
                    return false;
                }
                current_node = parent_id;
            }
            Combinator::Descendant => {
                let found = dom.ancestors(current_node).into_iter().find(|&ancestor| {
                    dom.get(ancestor)
                        .is_some_and(|a| matches_compound(compound, a))
                });
                match found {
                    Some(ancestor) => current_node = ancestor,
                    None => return false,
                }
            }
        }
    }

    true
}

/// Check whether a compound selector matches a single element's data.
fn matches_compound(compound: &CompoundSelector, node: &ElementData) -> bool {
    compound.components.iter().all(|component| match component {
        SelectorComponent::Type(name) => node.tag == *name,
        SelectorComponent::Universal => true,
        SelectorComponent::Class(name) => node.has_class(name),
        SelectorComponent::Id(name) => node.id.as_deref() == Some(name.as_str()),
        SelectorComponent::Attribute { name, value: None } => node.has_attribute(name),
        SelectorComponent::Attribute {
            name,
            value: Some(expected),
        } => node.attribute(name).as_deref() == Some(expected.as_str()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::parser::parse_selector;

    /// ```text
    ///        body
    ///       /    \
    ///    form     aside.nav
    ///   /    \
    ///  div.row  input#done[type=checkbox]
    ///   |
    ///  input[name=title]
    /// ```
    fn build() -> (Dom, NodeId, NodeId, NodeId, NodeId, NodeId) {
        let mut dom = Dom::new();
        let body = dom.insert(ElementData::new("body"));
        let form = dom.insert_child(body, ElementData::new("form"));
        let aside = dom.insert_child(body, ElementData::new("aside").with_class("nav"));
        let row = dom.insert_child(form, ElementData::new("div").with_class("row"));
        let title = dom.insert_child(row, ElementData::new("input").with_attr("name", "title"));
        let done = dom.insert_child(
            form,
            ElementData::new("input")
                .with_id("done")
                .with_attr("type", "checkbox"),
        );
        let _ = aside;
        (dom, body, form, row, title, done)
    }

    fn matches(dom: &Dom, selector: &str, node: NodeId) -> bool {
        let list = parse_selector(selector).unwrap_or_else(|e| panic!("{e}"));
        matches_list(&list, node, dom)
    }

    #[test]
    fn type_class_id() {
        let (dom, _body, form, row, _title, done) = build();
        assert!(matches(&dom, "form", form));
        assert!(matches(&dom, "FORM", form));
        assert!(matches(&dom, ".row", row));
        assert!(matches(&dom, "#done", done));
        assert!(!matches(&dom, "#done", row));
        assert!(matches(&dom, "*", row));
    }

    #[test]
    fn attribute_presence_and_value() {
        let (dom, _body, _form, _row, title, done) = build();
        assert!(matches(&dom, "[name]", title));
        assert!(matches(&dom, "input[name=title]", title));
        assert!(!matches(&dom, "input[name=other]", title));
        assert!(matches(&dom, "[type=checkbox]", done));
        assert!(matches(&dom, "[id=done]", done));
    }

    #[test]
    fn descendant_combinator() {
        let (dom, _body, _form, _row, title, done) = build();
        assert!(matches(&dom, "form input", title));
        assert!(matches(&dom, "body input", done));
        assert!(!matches(&dom, "aside input", title));
    }

    #[test]
    fn child_combinator() {
        let (dom, _body, _form, _row, title, done) = build();
        assert!(matches(&dom, "form > input", done));
        assert!(!matches(&dom, "form > input", title));
        assert!(matches(&dom, "form > .row > input", title));
    }

    #[test]
    fn list_matches_any() {
        let (dom, _body, form, row, ..) = build();
        assert!(matches(&dom, "aside, form", form));
        assert!(matches(&dom, "aside, .row", row));
    }
}
