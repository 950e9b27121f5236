//! Built-in bears shipped with the `ursa` binary.

use std::sync::Arc;

use serde_json::json;
use ursa_core::{
    fails, yields, AnalysisError, AnalysisInput, Bear, BearSpec, BoundParams, ParamSpec, ResultItem,
    ResultStream,
};
use ursa_engine::BearRegistry;

pub const DEFAULT_MAX_LINE_LENGTH: i64 = 80;

/// Registry holding every built-in bear.
pub fn registry() -> BearRegistry {
    BearRegistry::new()
        .with(Arc::new(LineCountBear::new()))
        .with(Arc::new(LongLineBear::new()))
        .with(Arc::new(ProjectSummaryBear::new()))
        .with(Arc::new(SummaryEchoBear::new()))
}

fn line_length(line: &str) -> usize {
    line.trim_end_matches(['\n', '\r']).chars().count()
}

/// Reports the number of lines of each file.
pub struct LineCountBear {
    spec: BearSpec,
}

impl LineCountBear {
    pub fn new() -> Self {
        Self {
            spec: BearSpec::file("LineCountBear"),
        }
    }
}

impl Bear for LineCountBear {
    fn spec(&self) -> &BearSpec {
        &self.spec
    }

    fn analyze<'a>(&'a self, input: AnalysisInput<'a>, _params: &'a BoundParams) -> ResultStream<'a> {
        let AnalysisInput::File { filename, lines } = input else {
            return fails(AnalysisError::failed("LineCountBear expects a file"));
        };
        yields([ResultItem::new(json!({ "file": filename, "lines": lines.len() }))])
    }
}

/// Flags lines longer than `max_line_length` characters.
pub struct LongLineBear {
    spec: BearSpec,
}

impl LongLineBear {
    pub fn new() -> Self {
        Self {
            spec: BearSpec::file("LongLineBear")
                .with_param(ParamSpec::optional("max_line_length", DEFAULT_MAX_LINE_LENGTH)),
        }
    }
}

impl Bear for LongLineBear {
    fn spec(&self) -> &BearSpec {
        &self.spec
    }

    fn analyze<'a>(&'a self, input: AnalysisInput<'a>, params: &'a BoundParams) -> ResultStream<'a> {
        let AnalysisInput::File { filename, lines } = input else {
            return fails(AnalysisError::failed("LongLineBear expects a file"));
        };
        let raw = params.int("max_line_length").unwrap_or(DEFAULT_MAX_LINE_LENGTH);
        let Ok(max) = usize::try_from(raw) else {
            return fails(AnalysisError::failed(format!("max_line_length must not be negative, got {raw}")));
        };

        Box::new(lines.iter().enumerate().filter_map(move |(index, line)| {
            let length = line_length(line);
            (length > max).then(|| {
                Ok::<_, AnalysisError>(ResultItem::new(json!({
                    "file": filename,
                    "line": index + 1,
                    "length": length,
                    "max": max,
                })))
            })
        }))
    }
}

/// Summarizes the whole file set: file count and total lines.
pub struct ProjectSummaryBear {
    spec: BearSpec,
}

impl ProjectSummaryBear {
    pub fn new() -> Self {
        Self {
            spec: BearSpec::project("ProjectSummaryBear"),
        }
    }
}

impl Bear for ProjectSummaryBear {
    fn spec(&self) -> &BearSpec {
        &self.spec
    }

    fn analyze<'a>(&'a self, input: AnalysisInput<'a>, _params: &'a BoundParams) -> ResultStream<'a> {
        let AnalysisInput::Project { files } = input else {
            return fails(AnalysisError::failed("ProjectSummaryBear expects the file set"));
        };
        let lines: usize = files.values().map(Vec::len).sum();
        let longest = files
            .iter()
            .max_by_key(|(_, lines)| lines.len())
            .map(|(name, _)| name.as_str());
        yields([ResultItem::new(json!({
            "files": files.len(),
            "lines": lines,
            "longest_file": longest,
        }))])
    }
}

/// Re-reports every line count and project summary as readable text.
pub struct SummaryEchoBear {
    spec: BearSpec,
}

impl SummaryEchoBear {
    pub fn new() -> Self {
        Self {
            spec: BearSpec::dependent("SummaryEchoBear", ["LineCountBear", "ProjectSummaryBear"]),
        }
    }
}

impl Bear for SummaryEchoBear {
    fn spec(&self) -> &BearSpec {
        &self.spec
    }

    fn analyze<'a>(&'a self, input: AnalysisInput<'a>, _params: &'a BoundParams) -> ResultStream<'a> {
        let AnalysisInput::Dependency { bear, result } = input else {
            return fails(AnalysisError::failed("SummaryEchoBear expects a dependency result"));
        };
        let value = result.value();
        let line = match bear.name() {
            "LineCountBear" => format!(
                "{} has {} lines",
                value["file"].as_str().unwrap_or("?"),
                value["lines"]
            ),
            "ProjectSummaryBear" => format!("{} files, {} lines in total", value["files"], value["lines"]),
            other => format!("{other}: {result}"),
        };
        yields([ResultItem::from(line)])
    }
}
