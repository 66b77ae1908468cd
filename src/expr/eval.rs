//! Tree-walking interpreter over [`Expr`].
//!
//! Free variables resolve only against the [`Scope`] passed in. Calls are
//! limited to values that name a formatter in the scope's registry.

use std::collections::BTreeMap;

use crate::expr::ast::{BinaryOp, Expr, LogicalOp, UnaryOp};
use crate::expr::formatters::FormatterRegistry;
use crate::value::Value;

/// Errors raised while evaluating an expression.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum EvalError {
    #[error("{0} is not defined")]
    UnknownIdentifier(String),
    #[error("{0} is not a function")]
    NotCallable(String),
    #[error("unknown formatter: {0}")]
    UnknownFormatter(String),
    #[error("type error: {0}")]
    Type(String),
    #[error("invalid date: {0}")]
    InvalidDate(String),
}

/// Variables visible to an expression plus the formatters it may call.
#[derive(Debug, Clone)]
pub struct Scope<'a> {
    vars: BTreeMap<String, Value>,
    formatters: &'a FormatterRegistry,
}

impl<'a> Scope<'a> {
    /// An empty scope over `formatters`. No formatter names are bound yet.
    pub fn new(formatters: &'a FormatterRegistry) -> Self {
        Self {
            vars: BTreeMap::new(),
            formatters,
        }
    }

    /// Bind every registered formatter under its own name.
    pub fn with_formatters(mut self) -> Self {
        for name in self.formatters.names() {
            self.vars.insert(name.to_owned(), Value::Formatter(name.to_owned()));
        }
        self
    }

    /// Bind (or rebind) a variable.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    /// Bind every entry of `vars`, overriding existing bindings.
    pub fn extend(&mut self, vars: impl IntoIterator<Item = (String, Value)>) {
        self.vars.extend(vars);
    }

    /// Look up a variable.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Evaluate an expression in this scope.
    pub fn eval(&self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Ident(name) => self
                .vars
                .get(name)
                .cloned()
                .ok_or_else(|| EvalError::UnknownIdentifier(name.clone())),
            Expr::Array(items) => Ok(Value::List(
                items
                    .iter()
                    .map(|item| self.eval(item))
                    .collect::<Result<_, _>>()?,
            )),
            Expr::Member { object, property } => {
                let object = self.eval(object)?;
                get_property(&object, property)
            }
            Expr::Index { object, index } => {
                let object = self.eval(object)?;
                let key = self.eval(index)?;
                get_index(&object, &key)
            }
            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                Ok(match op {
                    UnaryOp::Not => Value::Bool(!value.is_truthy()),
                    UnaryOp::Negate => Value::Number(-value.to_number()),
                    UnaryOp::Plus => Value::Number(value.to_number()),
                })
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                Ok(binary(*op, &left, &right))
            }
            Expr::Logical { op, left, right } => {
                let left = self.eval(left)?;
                let take_left = match op {
                    LogicalOp::And => !left.is_truthy(),
                    LogicalOp::Or => left.is_truthy(),
                    LogicalOp::Nullish => !left.is_nullish(),
                };
                if take_left {
                    Ok(left)
                } else {
                    self.eval(right)
                }
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test)?.is_truthy() {
                    self.eval(consequent)
                } else {
                    self.eval(alternate)
                }
            }
            Expr::Call { callee, args } => {
                let callee_value = self.eval(callee)?;
                let Value::Formatter(name) = callee_value else {
                    return Err(EvalError::NotCallable(describe_callee(callee)));
                };
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                self.formatters.call(&name, &args)
            }
        }
    }
}

fn describe_callee(callee: &Expr) -> String {
    match callee {
        Expr::Ident(name) => name.clone(),
        Expr::Member { property, .. } => property.clone(),
        _ => "expression".to_owned(),
    }
}

fn get_property(object: &Value, property: &str) -> Result<Value, EvalError> {
    match object {
        Value::Undefined | Value::Null => Err(EvalError::Type(format!(
            "cannot read property '{property}' of {}",
            object.type_name()
        ))),
        Value::Map(fields) => Ok(fields.get(property).cloned().unwrap_or_default()),
        Value::List(items) if property == "length" => Ok(Value::Number(items.len() as f64)),
        // Strings are measured and indexed in chars.
        Value::String(s) if property == "length" => Ok(Value::Number(s.chars().count() as f64)),
        _ => Ok(Value::Undefined),
    }
}

fn get_index(object: &Value, key: &Value) -> Result<Value, EvalError> {
    match object {
        Value::List(items) => Ok(list_position(key, items.len())
            .map(|i| items[i].clone())
            .unwrap_or_else(|| get_property(object, &key.to_js_string()).unwrap_or_default())),
        Value::String(s) => Ok(list_position(key, s.chars().count())
            .and_then(|i| s.chars().nth(i))
            .map(|ch| Value::String(ch.to_string()))
            .unwrap_or_default()),
        other => get_property(other, &key.to_js_string()),
    }
}

/// An in-bounds integral position, if `key` is one.
fn list_position(key: &Value, len: usize) -> Option<usize> {
    let n = match key {
        Value::Number(n) => *n,
        Value::String(s) => s.parse::<f64>().ok()?,
        _ => return None,
    };
    (n >= 0.0 && n.fract() == 0.0 && (n as usize) < len).then_some(n as usize)
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::Add => {
            if concatenates(left) || concatenates(right) {
                Value::String(left.to_js_string() + &right.to_js_string())
            } else {
                Value::Number(left.to_number() + right.to_number())
            }
        }
        BinaryOp::Sub => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::Mul => Value::Number(left.to_number() * right.to_number()),
        BinaryOp::Div => Value::Number(left.to_number() / right.to_number()),
        BinaryOp::Rem => Value::Number(left.to_number() % right.to_number()),
        BinaryOp::Less => Value::Bool(compare(left, right, |o| o.is_lt())),
        BinaryOp::LessEq => Value::Bool(compare(left, right, |o| o.is_le())),
        BinaryOp::Greater => Value::Bool(compare(left, right, |o| o.is_gt())),
        BinaryOp::GreaterEq => Value::Bool(compare(left, right, |o| o.is_ge())),
        BinaryOp::Eq => Value::Bool(loose_equals(left, right)),
        BinaryOp::NotEq => Value::Bool(!loose_equals(left, right)),
        BinaryOp::StrictEq => Value::Bool(strict_equals(left, right)),
        BinaryOp::StrictNotEq => Value::Bool(!strict_equals(left, right)),
    }
}

/// `+` concatenates when either side converts to a string primitive.
fn concatenates(value: &Value) -> bool {
    matches!(
        value,
        Value::String(_) | Value::List(_) | Value::Map(_) | Value::Formatter(_)
    )
}

/// Relational comparison: strings compare lexicographically, everything else
/// numerically. Any comparison involving NaN is false.
fn compare(left: &Value, right: &Value, test: fn(std::cmp::Ordering) -> bool) -> bool {
    if let (Value::String(a), Value::String(b)) = (left, right) {
        return test(a.cmp(b));
    }
    left.to_number()
        .partial_cmp(&right.to_number())
        .is_some_and(test)
}

fn strict_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a == b,
        (a, b) => std::mem::discriminant(a) == std::mem::discriminant(b) && a == b,
    }
}

fn loose_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
        (a, b) if std::mem::discriminant(a) == std::mem::discriminant(b) => strict_equals(a, b),
        (
            Value::String(_) | Value::Number(_) | Value::Bool(_),
            Value::String(_) | Value::Number(_) | Value::Bool(_),
        ) => left.to_number() == right.to_number(),
        _ => left.to_js_string() == right.to_js_string(),
    }
}
