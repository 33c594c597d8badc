//! Argument values supplied to reverse resolution.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Arguments keyed by name. Ordered so rendered query strings are stable.
pub type ArgMap = BTreeMap<String, ArgValue>;

/// A scalar argument or an ordered multi-value list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ArgValue {
    Single(String),
    List(Vec<String>),
}

impl ArgValue {
    /// The value used for path binding: the scalar, or the first list element.
    pub fn first(&self) -> Option<&str> {
        match self {
            ArgValue::Single(value) => Some(value),
            ArgValue::List(values) => values.first().map(String::as_str),
        }
    }

    /// Every value, in order.
    pub fn values(&self) -> Vec<&str> {
        match self {
            ArgValue::Single(value) => vec![value.as_str()],
            ArgValue::List(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

/// A `:`-prefixed value kept literal for client-side templating.
pub fn is_deferred(value: &str) -> bool {
    value.starts_with(':')
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Single(value) => f.write_str(value),
            ArgValue::List(values) => write!(f, "[{}]", values.join(", ")),
        }
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::Single(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        ArgValue::Single(value)
    }
}

impl From<&String> for ArgValue {
    fn from(value: &String) -> Self {
        ArgValue::Single(value.clone())
    }
}

impl From<Vec<String>> for ArgValue {
    fn from(values: Vec<String>) -> Self {
        ArgValue::List(values)
    }
}

impl From<Vec<&str>> for ArgValue {
    fn from(values: Vec<&str>) -> Self {
        ArgValue::List(values.into_iter().map(str::to_string).collect())
    }
}

/// Build an [`ArgMap`] from `(name, value)` pairs.
pub fn arg_map<K, V, I>(pairs: I) -> ArgMap
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<ArgValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
