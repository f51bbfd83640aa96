//! Runtime values of the configuration language.
//!
//! Literals in the expression tree and attributes on evaluated objects are both
//! [`Value`]s. Only the operations the compiler's emitted nodes rely on are
//! defined here; the rest of the language lives with the external evaluator.

use std::fmt;

use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;

use crate::ValueError;

/// A dictionary value: attribute name to value.
pub type Dictionary = FxHashMap<String, Value>;

/// A configuration-language value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value {
    /// The absent value (`null`).
    #[default]
    Empty,
    /// `true` / `false`.
    Boolean(bool),
    /// All numbers are doubles.
    Number(OrderedFloat<f64>),
    /// Strings.
    String(String),
    /// Ordered list.
    Array(Vec<Value>),
    /// Keyed attributes.
    Dictionary(Dictionary),
}

impl Value {
    /// Name of this value's type, as used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Empty => "Empty",
            Value::Boolean(_) => "Boolean",
            Value::Number(_) => "Number",
            Value::String(_) => "String",
            Value::Array(_) => "Array",
            Value::Dictionary(_) => "Dictionary",
        }
    }

    /// Whether this is [`Value::Empty`].
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Truthiness used by filters: empty containers, `0`, `""` and `null` are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Empty => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => n.0 != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Dictionary(d) => !d.is_empty(),
        }
    }

    /// Borrow the string payload.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the array payload.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Borrow the dictionary payload.
    pub fn as_dictionary(&self) -> Option<&Dictionary> {
        match self {
            Value::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    /// The `+` / `+=` operator.
    ///
    /// `null` is the identity on either side. Arrays concatenate, dictionaries
    /// merge with the right-hand side winning, and strings concatenate with any
    /// scalar.
    pub fn add(self, rhs: Value) -> Result<Value, ValueError> {
        match (self, rhs) {
            (Value::Empty, rhs) => Ok(rhs),
            (lhs, Value::Empty) => Ok(lhs),
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::String(mut a), Value::String(b)) => {
                a.push_str(&b);
                Ok(Value::String(a))
            }
            (Value::String(mut a), b @ (Value::Number(_) | Value::Boolean(_))) => {
                a.push_str(&b.to_string());
                Ok(Value::String(a))
            }
            (Value::Array(mut a), Value::Array(b)) => {
                a.extend(b);
                Ok(Value::Array(a))
            }
            (Value::Dictionary(mut a), Value::Dictionary(b)) => {
                a.extend(b);
                Ok(Value::Dictionary(a))
            }
            (lhs, rhs) => Err(ValueError::InvalidOperands {
                op: "+",
                left: lhs.type_name(),
                right: rhs.type_name(),
            }),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n.0),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(items) => {
                write!(f, "[ ")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match item {
                        Value::String(s) => write!(f, "{:?}", s)?,
                        other => write!(f, "{}", other)?,
                    }
                }
                write!(f, " ]")
            }
            Value::Dictionary(d) => {
                let mut keys: Vec<_> = d.keys().collect();
                keys.sort();
                write!(f, "{{ ")?;
                for (i, key) in keys.into_iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} = {}", key, d[key])?;
                }
                write!(f, " }}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(OrderedFloat(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(OrderedFloat(n as f64))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Dictionary> for Value {
    fn from(d: Dictionary) -> Self {
        Value::Dictionary(d)
    }
}
