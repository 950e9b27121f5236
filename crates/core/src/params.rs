use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::section::Section;

/// Declared type of a configurable bear parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Int,
    Float,
    Bool,
    Str,
    StrList,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamKind::Int => "int",
            ParamKind::Float => "float",
            ParamKind::Bool => "bool",
            ParamKind::Str => "str",
            ParamKind::StrList => "str_list",
        };
        f.write_str(name)
    }
}

/// A typed parameter value, either a declared default or coerced from settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    StrList(Vec<String>),
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Bool(_) => ParamKind::Bool,
            ParamValue::Int(_) => ParamKind::Int,
            ParamValue::Float(_) => ParamKind::Float,
            ParamValue::Str(_) => ParamKind::Str,
            ParamValue::StrList(_) => ParamKind::StrList,
        }
    }

    /// Coerce a raw settings string into `kind`. Returns `None` when the
    /// string is not a valid representation.
    pub fn parse(kind: ParamKind, raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        match kind {
            ParamKind::Int => trimmed.parse().ok().map(ParamValue::Int),
            ParamKind::Float => trimmed.parse().ok().map(ParamValue::Float),
            ParamKind::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some(ParamValue::Bool(true)),
                "false" | "no" | "off" | "0" => Some(ParamValue::Bool(false)),
                _ => None,
            },
            ParamKind::Str => Some(ParamValue::Str(raw.to_string())),
            ParamKind::StrList => Some(ParamValue::StrList(
                trimmed
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            )),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ParamValue::StrList(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Str(v) => f.write_str(v),
            ParamValue::StrList(v) => f.write_str(&v.join(", ")),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(i64::from(v))
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(v: Vec<String>) -> Self {
        ParamValue::StrList(v)
    }
}

/// One entry of a bear's parameter schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    /// `None` marks the parameter as required.
    pub default: Option<ParamValue>,
}

impl ParamSpec {
    /// A parameter that must be present in the settings section.
    pub fn required(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
        }
    }

    /// A parameter whose kind is taken from its default value.
    pub fn optional(name: impl Into<String>, default: impl Into<ParamValue>) -> Self {
        let default = default.into();
        Self {
            name: name.into(),
            kind: default.kind(),
            default: Some(default),
        }
    }

    fn resolve(&self, bear: &str, section: &Section) -> Result<ParamValue, ConfigurationError> {
        match section.get(&self.name) {
            Some(raw) => ParamValue::parse(self.kind, raw).ok_or_else(|| {
                ConfigurationError::InvalidParameter {
                    bear: bear.to_string(),
                    param: self.name.clone(),
                    value: raw.to_string(),
                    kind: self.kind,
                }
            }),
            None => self
                .default
                .clone()
                .ok_or_else(|| ConfigurationError::MissingParameter {
                    bear: bear.to_string(),
                    param: self.name.clone(),
                }),
        }
    }
}

/// Parameter values resolved once per bear instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoundParams(BTreeMap<String, ParamValue>);

impl BoundParams {
    /// Resolve every declared parameter against `section`, falling back to
    /// declared defaults.
    pub fn resolve(
        bear: &str,
        schema: &[ParamSpec],
        section: &Section,
    ) -> Result<Self, ConfigurationError> {
        let mut values = BTreeMap::new();
        for spec in schema {
            values.insert(spec.name.clone(), spec.resolve(bear, section)?);
        }
        Ok(Self(values))
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ParamValue::as_int)
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ParamValue::as_float)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(ParamValue::as_bool)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ParamValue::as_str)
    }

    pub fn list(&self, name: &str) -> Option<&[String]> {
        self.get(name).and_then(ParamValue::as_list)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
