//! Consumer projection: write a value onto every element a declaration names.
//!
//! A declaration is `selector[:attribute](, selector[:attribute])*`, for
//! example `.title, input[name=title], a.link:href`.

use crate::dom::{Dom, ElementData, NodeId};
use crate::selector::{parse_selector, SelectorList};
use crate::value::Value;

/// Tag of the custom element that holds a form value like an input does.
pub const MODEL_INPUT_TAG: &str = "model-input";

/// One `selector[:attribute]` entry of a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerBinding {
    pub selector: String,
    pub attribute: Option<String>,
}

/// Parse a declaration into bindings.
///
/// Entries are split on `,`, then on `:`; both parts are trimmed and only
/// the first two parts are used. Entries with an empty selector are dropped.
pub fn parse_bindings(declaration: &str) -> Vec<ConsumerBinding> {
    declaration
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.trim().split(':').map(str::trim);
            let selector = parts.next().filter(|s| !s.is_empty())?;
            let attribute = parts.next().filter(|a| !a.is_empty());
            Some(ConsumerBinding {
                selector: selector.to_owned(),
                attribute: attribute.map(str::to_owned),
            })
        })
        .collect()
}

/// Apply `value` to every descendant of `root` named by `declaration`.
///
/// With an attribute, booleans toggle the attribute's presence and anything
/// else sets it to the value's text. Without one, checkboxes toggle `checked`,
/// inputs and `model-input` elements take the value in their value slot, and
/// every other element takes it as content, replacing its children. Content
/// is inserted as-is, so callers pass already-escaped values.
pub fn project(dom: &mut Dom, root: NodeId, declaration: &str, value: &Value) {
    for binding in parse_bindings(declaration) {
        let selectors: SelectorList = match parse_selector(&binding.selector) {
            Ok(selectors) => selectors,
            Err(error) => {
                tracing::warn!(selector = %binding.selector, %error, "skipping consumer entry");
                continue;
            }
        };

        for node in dom.query_selector_all(root, &selectors) {
            // An earlier content write may have removed this element.
            if !dom.contains(node) {
                continue;
            }
            match &binding.attribute {
                Some(attribute) => {
                    if let Some(element) = dom.get_mut(node) {
                        set_attribute_value(element, attribute, value);
                    }
                }
                None => project_default(dom, node, value),
            }
        }
    }
}

fn set_attribute_value(element: &mut ElementData, attribute: &str, value: &Value) {
    match value {
        Value::Bool(true) => element.set_attribute(attribute, String::new()),
        Value::Bool(false) => element.remove_attribute(attribute),
        other => element.set_attribute(attribute, other.to_js_string()),
    }
}

fn project_default(dom: &mut Dom, node: NodeId, value: &Value) {
    let Some(element) = dom.get_mut(node) else {
        return;
    };
    if element.is_checkbox() {
        set_attribute_value(element, "checked", &Value::Bool(value.is_truthy()));
    } else if element.tag == "input" || element.tag == MODEL_INPUT_TAG {
        element.value = Some(value.to_js_string());
    } else {
        element.content = Some(value.to_js_string());
        dom.clear_children(node);
    }
}
