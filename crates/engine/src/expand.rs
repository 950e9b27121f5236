//! Work-unit expansion: one bear instance becomes the concrete, independently
//! runnable units it must execute before it counts as complete.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use ursa_core::{AnalysisError, AnalysisInput, BearInstance, CacheKey, Granularity, ResultItem};

use crate::cache;
use crate::graph::InstanceId;

/// Input carried by one work unit.
pub enum UnitInput {
    File { filename: String },
    Project,
    Dependency {
        dependency: Arc<BearInstance>,
        result: ResultItem,
    },
}

/// A single dispatchable invocation of a bear's analysis.
pub struct WorkUnit {
    pub instance: InstanceId,
    pub bear: Arc<BearInstance>,
    pub input: UnitInput,
    /// Set only for cache-eligible units.
    pub cache_key: Option<CacheKey>,
    pub label: String,
}

/// What a finished unit produced. Items yielded before a failure are kept.
#[derive(Debug)]
pub struct UnitOutput {
    pub results: Vec<ResultItem>,
    pub error: Option<AnalysisError>,
    pub duration: Duration,
}

impl WorkUnit {
    /// Run the analysis to exhaustion on the current thread.
    ///
    /// Panics inside the bear are caught and reported as failures.
    pub fn execute(&self) -> UnitOutput {
        let start = Instant::now();
        let mut results = Vec::new();

        let run = panic::catch_unwind(AssertUnwindSafe(|| -> Result<(), AnalysisError> {
            let input = self.analysis_input();
            for item in self.bear.bear().analyze(input, self.bear.params()) {
                results.push(item?);
            }
            Ok(())
        }));

        let error = match run {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(payload) => Some(AnalysisError::Panicked(panic_message(payload.as_ref()))),
        };

        UnitOutput {
            results,
            error,
            duration: start.elapsed(),
        }
    }

    fn analysis_input(&self) -> AnalysisInput<'_> {
        match &self.input {
            UnitInput::File { filename } => AnalysisInput::File {
                filename,
                lines: self
                    .bear
                    .files()
                    .get(filename)
                    .map(Vec::as_slice)
                    .unwrap_or_default(),
            },
            UnitInput::Project => AnalysisInput::Project {
                files: self.bear.files(),
            },
            UnitInput::Dependency { dependency, result } => AnalysisInput::Dependency {
                bear: dependency,
                result,
            },
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Expand `instance` into its work units.
///
/// `dependencies` pairs each completed dependency instance with the results
/// it produced. Each dependency is expanded on its own; results of different
/// dependencies are never combined.
pub fn expand(
    id: InstanceId,
    instance: &Arc<BearInstance>,
    dependencies: &[(&Arc<BearInstance>, &[ResultItem])],
) -> Vec<WorkUnit> {
    let unit = |input: UnitInput, cache_key: Option<CacheKey>, label: String| WorkUnit {
        instance: id,
        bear: Arc::clone(instance),
        input,
        cache_key,
        label,
    };

    match instance.spec().granularity() {
        Granularity::File => instance
            .files()
            .iter()
            .map(|(filename, lines)| {
                unit(
                    UnitInput::File {
                        filename: filename.clone(),
                    },
                    cache::key_for(instance, filename, lines),
                    format!("{}[{}]", instance.name(), filename),
                )
            })
            .collect(),
        Granularity::Project => vec![unit(
            UnitInput::Project,
            None,
            format!("{}[project]", instance.name()),
        )],
        Granularity::Dependent(_) => dependencies
            .iter()
            .flat_map(|&(dependency, results)| {
                results.iter().enumerate().map(move |(index, result)| {
                    (dependency, index, result)
                })
            })
            .map(|(dependency, index, result)| {
                unit(
                    UnitInput::Dependency {
                        dependency: Arc::clone(dependency),
                        result: result.clone(),
                    },
                    None,
                    format!("{}[{}#{}]", instance.name(), dependency.name(), index),
                )
            })
            .collect(),
    }
}
