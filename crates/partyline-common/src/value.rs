//! Scalar and list values accepted in path params and query strings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A scalar value that is stringified when it lands in a URL.
///
/// Deserializes from any JSON/TOML scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Boolean, rendered as `true` / `false`.
    Bool(bool),
    /// Integer.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// String, used verbatim.
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// A query parameter value: one scalar or a list of scalars.
///
/// A list expands to one `key=value` pair per element, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    /// A single value.
    One(ParamValue),
    /// Repeated values for the same key.
    Many(Vec<ParamValue>),
}

impl QueryValue {
    /// Stringified values in order.
    #[must_use]
    pub fn to_strings(&self) -> Vec<String> {
        match self {
            Self::One(value) => vec![value.to_string()],
            Self::Many(values) => values.iter().map(ToString::to_string).collect(),
        }
    }
}

impl From<ParamValue> for QueryValue {
    fn from(value: ParamValue) -> Self {
        Self::One(value)
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::One(value.into())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        Self::One(value.into())
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        Self::One(value.into())
    }
}

impl From<i32> for QueryValue {
    fn from(value: i32) -> Self {
        Self::One(value.into())
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        Self::One(value.into())
    }
}

impl From<Vec<ParamValue>> for QueryValue {
    fn from(values: Vec<ParamValue>) -> Self {
        Self::Many(values)
    }
}
