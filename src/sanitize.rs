//! Markup escaping for values headed into rendered output.

use crate::value::{Record, Value};

/// Placeholder emitted for values that have no text form.
pub const INVALID_PLACEHOLDER: &str = "[invalid]";

/// Line-break marker substituted for `\n` after entity escaping.
pub const LINE_BREAK: &str = "<br />";

/// Escape the five markup-significant characters, then replace newlines with
/// [`LINE_BREAK`].
///
/// Entity escaping runs first so the inserted marker is not itself escaped.
pub fn escape_str(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    escaped.replace('\n', LINE_BREAK)
}

/// Make a value safe for inclusion in markup.
///
/// Strings are escaped with [`escape_str`]. Values without a text form become
/// [`INVALID_PLACEHOLDER`]. Everything else, including null and undefined,
/// passes through unchanged.
pub fn escape(value: &Value) -> Value {
    match value {
        Value::String(text) => Value::String(escape_str(text)),
        other if other.display_string().is_none() => Value::from(INVALID_PLACEHOLDER),
        other => other.clone(),
    }
}

/// Escape every field of a record. Nested lists and maps are not descended into.
pub fn sanitize_record(record: &Record) -> Record {
    record
        .iter()
        .map(|(key, value)| (key.clone(), escape(value)))
        .collect()
}

/// Decode `&amp;`, `&lt;` and `&gt;` back into literal characters so that
/// expression source written inside escaped markup can use operators.
pub fn decode_expression(source: &str) -> String {
    source
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}
