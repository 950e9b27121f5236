use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::params::ParamKind;

/// Malformed bear declarations, unresolvable parameters and bad engine config.
///
/// Raised while building instances or loading configuration, before any
/// work is dispatched.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("dependent bear '{0}' declares no dependencies")]
    EmptyDependencies(String),

    #[error("bear '{bear}' is missing required parameter '{param}'")]
    MissingParameter { bear: String, param: String },

    #[error("bear '{bear}' parameter '{param}': cannot read {value:?} as {kind}")]
    InvalidParameter {
        bear: String,
        param: String,
        value: String,
        kind: ParamKind,
    },

    #[error("bear '{bear}' depends on unknown bear '{dependency}'")]
    UnknownDependency { bear: String, dependency: String },

    #[error("invalid engine config: {0}")]
    Engine(String),

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a single work unit's analysis call.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "detail", rename_all = "snake_case")]
pub enum AnalysisError {
    #[error("{0}")]
    Failed(String),

    #[error("analysis panicked: {0}")]
    Panicked(String),

    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

impl AnalysisError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Cache malfunction. The engine never treats this as fatal.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache lookup failed: {0}")]
    Lookup(String),

    #[error("cache store failed: {0}")]
    Store(String),
}
