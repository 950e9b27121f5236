//! Bear declarations and the analysis contract bear authors implement.
//!
//! A [`BearSpec`] is the immutable declaration: name, [`Granularity`] and
//! parameter schema. A [`Bear`] pairs a spec with the analysis logic the
//! engine calls once per work unit.

use std::collections::BTreeSet;
use std::iter;

use serde::Serialize;

use crate::error::{AnalysisError, ConfigurationError};
use crate::instance::BearInstance;
use crate::params::{BoundParams, ParamSpec};
use crate::result::{FileSet, ResultItem};

/// How a bear's work is split into units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "dependencies", rename_all = "snake_case")]
pub enum Granularity {
    /// One unit per file.
    File,
    /// One unit over the whole file set.
    Project,
    /// One unit per result of each named dependency bear.
    Dependent(BTreeSet<String>),
}

impl Granularity {
    pub fn tag(&self) -> &'static str {
        match self {
            Granularity::File => "file",
            Granularity::Project => "project",
            Granularity::Dependent(_) => "dependent",
        }
    }
}

/// Immutable declaration of a bear type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BearSpec {
    name: String,
    granularity: Granularity,
    params: Vec<ParamSpec>,
}

impl BearSpec {
    pub fn file(name: impl Into<String>) -> Self {
        Self::new(name, Granularity::File)
    }

    pub fn project(name: impl Into<String>) -> Self {
        Self::new(name, Granularity::Project)
    }

    pub fn dependent<I, S>(name: impl Into<String>, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let deps = dependencies.into_iter().map(Into::into).collect();
        Self::new(name, Granularity::Dependent(deps))
    }

    fn new(name: impl Into<String>, granularity: Granularity) -> Self {
        Self {
            name: name.into(),
            granularity,
            params: Vec::new(),
        }
    }

    /// Declare a configurable parameter.
    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn granularity(&self) -> &Granularity {
        &self.granularity
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Names of the bears this one depends on (empty unless dependent).
    pub fn dependencies(&self) -> impl Iterator<Item = &str> {
        let deps = match &self.granularity {
            Granularity::Dependent(deps) => Some(deps.iter().map(String::as_str)),
            _ => None,
        };
        deps.into_iter().flatten()
    }

    /// Only file bears have a stable per-unit fingerprint.
    pub fn is_cache_eligible(&self) -> bool {
        matches!(self.granularity, Granularity::File)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match &self.granularity {
            Granularity::Dependent(deps) if deps.is_empty() => {
                Err(ConfigurationError::EmptyDependencies(self.name.clone()))
            }
            _ => Ok(()),
        }
    }
}

/// The concrete input of one work unit.
#[derive(Debug, Clone, Copy)]
pub enum AnalysisInput<'a> {
    File {
        filename: &'a str,
        lines: &'a [String],
    },
    Project {
        files: &'a FileSet,
    },
    Dependency {
        bear: &'a BearInstance,
        result: &'a ResultItem,
    },
}

/// Lazy, finite sequence produced by one analysis call. An `Err` item ends
/// the unit as failed; items before it are kept.
pub type ResultStream<'a> = Box<dyn Iterator<Item = Result<ResultItem, AnalysisError>> + 'a>;

/// A unit of analysis logic.
pub trait Bear: Send + Sync {
    fn spec(&self) -> &BearSpec;

    /// Analyze one unit's input with the instance's bound parameters.
    fn analyze<'a>(&'a self, input: AnalysisInput<'a>, params: &'a BoundParams) -> ResultStream<'a>;

    fn name(&self) -> &str {
        self.spec().name()
    }
}

/// Wrap already-computed items as a [`ResultStream`].
pub fn yields<'a, I>(items: I) -> ResultStream<'a>
where
    I: IntoIterator<Item = ResultItem>,
    I::IntoIter: 'a,
{
    Box::new(items.into_iter().map(Ok))
}

/// A stream that fails immediately.
pub fn fails<'a>(error: AnalysisError) -> ResultStream<'a> {
    Box::new(iter::once(Err(error)))
}
