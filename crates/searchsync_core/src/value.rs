//! Dynamic attribute values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute name → value mapping of a record.
///
/// A `BTreeMap` keeps iteration order deterministic, which the change
/// tracker and the indexing engine both rely on.
pub type Attributes = BTreeMap<String, Value>;

/// A dynamic attribute value.
///
/// Values serialize to and from plain JSON. Equality is structural;
/// note that `Float(NaN)` is never equal to itself, so an attribute
/// holding NaN is reported as changed on every save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// Text string.
    Text(String),
    /// Ordered list of values.
    List(Vec<Value>),
    /// Nested map with string keys.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Returns the text if this is a `Text` value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer if this is an `Integer` value.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the boolean if this is a `Bool` value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns true for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Visits every text fragment contained in this value, depth first.
    pub fn for_each_text<'a>(&'a self, f: &mut impl FnMut(&'a str)) {
        match self {
            Value::Text(s) => f(s),
            Value::List(items) => {
                for item in items {
                    item.for_each_text(f);
                }
            }
            Value::Map(entries) => {
                for item in entries.values() {
                    item.for_each_text(f);
                }
            }
            _ => {}
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
