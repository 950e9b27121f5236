use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// In-memory files handed to bears: filename to ordered lines.
///
/// A `BTreeMap` keeps the set sorted by filename, which is the order
/// project bears see it in.
pub type FileSet = BTreeMap<String, Vec<String>>;

/// Split text into lines, keeping each line's terminator.
pub fn split_lines(content: &str) -> Vec<String> {
    content.split_inclusive('\n').map(str::to_string).collect()
}

/// An opaque value yielded by a bear's analysis.
///
/// The engine never inspects it; it only forwards it to the collector and
/// re-feeds it to dependent bears.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultItem(Value);

impl ResultItem {
    pub fn new(value: impl Into<Value>) -> Self {
        Self(value.into())
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// The payload as text, when it is a JSON string.
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }
}

impl fmt::Display for ResultItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

impl From<String> for ResultItem {
    fn from(s: String) -> Self {
        Self(Value::String(s))
    }
}

impl From<&str> for ResultItem {
    fn from(s: &str) -> Self {
        Self(Value::String(s.to_string()))
    }
}

impl From<Value> for ResultItem {
    fn from(v: Value) -> Self {
        Self(v)
    }
}
