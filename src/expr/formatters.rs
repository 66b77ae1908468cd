//! Built-in template formatters.
//!
//! Formatters are pure functions over [`Value`] arguments. Missing arguments
//! read as `undefined`, and string formatters coerce their first argument the
//! way `String(value)` does.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone, Timelike, Utc};

use crate::expr::eval::EvalError;
use crate::value::Value;

/// A formatter function.
pub type FormatterFn = Arc<dyn Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync>;

/// Named formatters available to template expressions.
#[derive(Clone, Default)]
pub struct FormatterRegistry {
    formatters: BTreeMap<String, FormatterFn>,
}

impl fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatterRegistry")
            .field("names", &self.formatters.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FormatterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in set: `url`, `slugify`, `lowerCase`, `upperCase`,
    /// `capitalize`, `trim`, `fallback`, `joinFields`, `date`.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("url", slugify);
        registry.register("slugify", slugify);
        registry.register("lowerCase", lower_case);
        registry.register("upperCase", upper_case);
        registry.register("capitalize", capitalize);
        registry.register("trim", trim);
        registry.register("fallback", fallback);
        registry.register("joinFields", join_fields);
        registry.register("date", date);
        registry
    }

    /// Register a formatter, replacing any existing one with the same name.
    pub fn register<F>(&mut self, name: impl Into<String>, formatter: F)
    where
        F: Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        self.formatters.insert(name.into(), Arc::new(formatter));
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.formatters.keys().map(String::as_str)
    }

    /// Whether a formatter is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.formatters.contains_key(name)
    }

    /// Invoke the formatter registered under `name`.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, EvalError> {
        let formatter = self
            .formatters
            .get(name)
            .ok_or_else(|| EvalError::UnknownFormatter(name.to_owned()))?;
        formatter(args)
    }
}

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

fn first_string(args: &[Value]) -> String {
    arg(args, 0).to_js_string()
}

/// Lower-case, then spaces to hyphens.
pub fn slugify(args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::String(first_string(args).to_lowercase().replace(' ', "-")))
}

pub fn lower_case(args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::String(first_string(args).to_lowercase()))
}

pub fn upper_case(args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::String(first_string(args).to_uppercase()))
}

/// Upper-case the first character, leave the rest untouched.
pub fn capitalize(args: &[Value]) -> Result<Value, EvalError> {
    let text = first_string(args);
    let mut chars = text.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    Ok(Value::String(capitalized))
}

pub fn trim(args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::String(first_string(args).trim().to_owned()))
}

/// First truthy argument, left to right; `undefined` if none.
pub fn fallback(args: &[Value]) -> Result<Value, EvalError> {
    Ok(args
        .iter()
        .find(|value| value.is_truthy())
        .cloned()
        .unwrap_or_default())
}

/// `joinFields(list, field, separator)`: read `field` off every element and
/// join the results. The separator defaults to `,`.
pub fn join_fields(args: &[Value]) -> Result<Value, EvalError> {
    let Value::List(items) = arg(args, 0) else {
        return Err(EvalError::Type(format!(
            "joinFields expects a list, got {}",
            arg(args, 0).type_name()
        )));
    };
    let field = arg(args, 1).to_js_string();
    let separator = match arg(args, 2) {
        Value::Undefined => ",".to_owned(),
        other => other.to_js_string(),
    };

    let parts = items
        .iter()
        .map(|item| match item {
            Value::Undefined | Value::Null => Err(EvalError::Type(format!(
                "cannot read property '{field}' of {}",
                item.type_name()
            ))),
            Value::Map(fields) => Ok(fields.get(&field).cloned().unwrap_or_default()),
            _ => Ok(Value::Undefined),
        })
        .map(|value| {
            value.map(|v| if v.is_nullish() { String::new() } else { v.to_js_string() })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Value::String(parts.join(&separator)))
}

/// Format a timestamp as `Month Day, Year at H:MM` in local time.
///
/// Numbers are milliseconds since the Unix epoch. Strings may be RFC 3339
/// date-times or `YYYY-MM-DD` dates (read as UTC midnight).
pub fn date(args: &[Value]) -> Result<Value, EvalError> {
    let timestamp = arg(args, 0);
    let local = to_local_datetime(&timestamp)
        .ok_or_else(|| EvalError::InvalidDate(timestamp.to_js_string()))?;
    Ok(Value::String(format_date(&local)))
}

/// The `date` formatter's output for an already-resolved local time.
pub fn format_date(moment: &DateTime<Local>) -> String {
    format!(
        "{} {}, {} at {}:{:02}",
        moment.format("%B"),
        moment.day(),
        moment.year(),
        moment.hour(),
        moment.minute()
    )
}

fn to_local_datetime(value: &Value) -> Option<DateTime<Local>> {
    match value {
        Value::Undefined => None,
        Value::String(text) => {
            if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
                return Some(parsed.with_timezone(&Local));
            }
            let day = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
            let midnight = Utc.from_utc_datetime(&day.and_hms_opt(0, 0, 0)?);
            Some(midnight.with_timezone(&Local))
        }
        other => {
            let millis = other.to_number();
            if !millis.is_finite() {
                return None;
            }
            Local.timestamp_millis_opt(millis as i64).single()
        }
    }
}
