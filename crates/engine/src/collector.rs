//! Output accumulation for one run.
//!
//! Every record is appended on the coordinating thread, so the collector
//! needs no locking. The optional callback sees each record as it lands.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use ursa_core::{AnalysisError, ResultItem};

use crate::metrics::RunStats;

/// A result item attributed to the bear that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    pub bear: String,
    pub item: ResultItem,
}

/// A unit that errored, panicked or timed out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord {
    pub bear: String,
    /// Label of the failed unit, e.g. `LineCountBear[src/main.rs]`.
    pub unit: String,
    pub error: AnalysisError,
}

/// One entry of the combined output stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Output {
    Result(ResultRecord),
    Failure(FailureRecord),
}

pub(crate) struct Collector<F: FnMut(&Output)> {
    outputs: Vec<Output>,
    on_output: F,
}

impl<F: FnMut(&Output)> Collector<F> {
    pub(crate) fn new(on_output: F) -> Self {
        Self {
            outputs: Vec::new(),
            on_output,
        }
    }

    pub(crate) fn push(&mut self, output: Output) {
        (self.on_output)(&output);
        self.outputs.push(output);
    }

    pub(crate) fn into_outputs(self) -> Vec<Output> {
        self.outputs
    }
}

/// Everything a run produced: results and failures across requested bears
/// and their pulled-in dependencies.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// Records in the order they were collected.
    pub outputs: Vec<Output>,
    pub stats: RunStats,
    /// Set when a failure stopped dispatch early.
    pub aborted: bool,
    /// Bears that never completed because the run was aborted.
    pub unfinished: Vec<String>,
}

impl RunReport {
    pub fn results(&self) -> impl Iterator<Item = &ResultRecord> {
        self.outputs.iter().filter_map(|o| match o {
            Output::Result(r) => Some(r),
            Output::Failure(_) => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = &FailureRecord> {
        self.outputs.iter().filter_map(|o| match o {
            Output::Failure(f) => Some(f),
            Output::Result(_) => None,
        })
    }

    /// Items produced by `bear`, in collection order.
    pub fn results_of<'a>(&'a self, bear: &'a str) -> impl Iterator<Item = &'a ResultItem> + 'a {
        self.results().filter(move |r| r.bear == bear).map(|r| &r.item)
    }

    /// Every result rendered as text, sorted. Handy where order is unspecified.
    pub fn result_strings(&self) -> Vec<String> {
        let mut out: Vec<String> = self.results().map(|r| r.item.to_string()).collect();
        out.sort();
        out
    }

    pub fn is_success(&self) -> bool {
        !self.aborted && self.failures().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(bear: &str, item: &str) -> Output {
        Output::Result(ResultRecord {
            bear: bear.into(),
            item: ResultItem::from(item),
        })
    }

    fn report(outputs: Vec<Output>) -> RunReport {
        RunReport {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            outputs,
            stats: RunStats::default(),
            aborted: false,
            unfinished: Vec::new(),
        }
    }

    #[test]
    fn callback_sees_every_record_in_order() {
        let mut seen = Vec::new();
        let mut collector = Collector::new(|o: &Output| seen.push(o.clone()));
        collector.push(result("A", "1"));
        collector.push(result("B", "2"));
        let outputs = collector.into_outputs();
        assert_eq!(outputs.len(), 2);
        assert_eq!(seen, outputs);
    }

    #[test]
    fn report_filters_by_kind_and_bear() {
        let report = report(vec![
            result("A", "z"),
            Output::Failure(FailureRecord {
                bear: "A".into(),
                unit: "A[f]".into(),
                error: AnalysisError::failed("boom"),
            }),
            result("B", "a"),
        ]);

        assert_eq!(report.results().count(), 2);
        assert_eq!(report.failures().count(), 1);
        assert_eq!(report.results_of("A").collect::<Vec<_>>(), vec![&ResultItem::from("z")]);
        assert_eq!(report.result_strings(), vec!["a", "z"]);
        assert!(!report.is_success());
    }

    #[test]
    fn records_serialize_with_kind_tag() {
        let json = serde_json::to_value(result("A", "x")).unwrap();
        assert_eq!(json["kind"], "result");
        assert_eq!(json["bear"], "A");
        assert_eq!(json["item"], "x");
    }
}
