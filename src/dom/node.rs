//! Node types: NodeId, ElementData.

use std::collections::BTreeMap;

use slotmap::new_key_type;

new_key_type! {
    /// Unique identifier for an element. Copy, lightweight (u64).
    pub struct NodeId;
}

/// Data associated with a single element.
///
/// `id` and `class` live in dedicated fields for fast selector matching; every
/// other attribute lives in `attributes`. [`ElementData::attribute`] reads all
/// three uniformly.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    /// Tag name, stored lower-case (e.g. `"input"`, `"model-input"`).
    pub tag: String,
    /// Optional unique id (`#id` selector).
    pub id: Option<String>,
    /// Classes (`.class` selector).
    pub classes: Vec<String>,
    /// Remaining attributes, by name.
    pub attributes: BTreeMap<String, String>,
    /// Form value slot (inputs and value-holding custom elements).
    pub value: Option<String>,
    /// Markup content assigned by projection.
    pub content: Option<String>,
}

impl ElementData {
    /// Create a new element with the given tag name.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            id: None,
            classes: Vec::new(),
            attributes: BTreeMap::new(),
            value: None,
            content: None,
        }
    }

    /// Set the id (builder).
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a single class (builder).
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        let class = class.into();
        if !self.classes.contains(&class) {
            self.classes.push(class);
        }
        self
    }

    /// Set an attribute (builder).
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(&name.into(), value.into());
        self
    }

    /// Set the form value slot (builder).
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Check whether this element has a given class.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Read an attribute, including `id` and `class`.
    pub fn attribute(&self, name: &str) -> Option<String> {
        match name {
            "id" => self.id.clone(),
            "class" if self.classes.is_empty() => None,
            "class" => Some(self.classes.join(" ")),
            other => self.attributes.get(other).cloned(),
        }
    }

    /// Whether the attribute is present.
    pub fn has_attribute(&self, name: &str) -> bool {
        match name {
            "id" => self.id.is_some(),
            "class" => !self.classes.is_empty(),
            other => self.attributes.contains_key(other),
        }
    }

    /// Set an attribute. `id` and `class` update their dedicated fields.
    pub fn set_attribute(&mut self, name: &str, value: String) {
        match name {
            "id" => self.id = Some(value),
            "class" => {
                self.classes = value.split_whitespace().map(str::to_owned).collect();
            }
            other => {
                self.attributes.insert(other.to_owned(), value);
            }
        }
    }

    /// Remove an attribute. No-op if absent.
    pub fn remove_attribute(&mut self, name: &str) {
        match name {
            "id" => self.id = None,
            "class" => self.classes.clear(),
            other => {
                self.attributes.remove(other);
            }
        }
    }

    /// Whether this is an `<input type="checkbox">`.
    pub fn is_checkbox(&self) -> bool {
        self.tag == "input"
            && self
                .attributes
                .get("type")
                .is_some_and(|t| t.eq_ignore_ascii_case("checkbox"))
    }
}
