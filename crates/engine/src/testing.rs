//! Mock bears shared by the engine's unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use ursa_core::{
    fails, yields, AnalysisError, AnalysisInput, Bear, BearSpec, BoundParams, FileSet, ParamSpec,
    ResultItem, ResultStream,
};

/// Yields the same fixed items for every unit.
pub struct StaticBear {
    spec: BearSpec,
    items: Vec<String>,
}

impl StaticBear {
    pub fn arc(spec: BearSpec, items: &[&str]) -> Arc<dyn Bear> {
        Arc::new(Self {
            spec,
            items: items.iter().map(|s| s.to_string()).collect(),
        })
    }
}

impl Bear for StaticBear {
    fn spec(&self) -> &BearSpec {
        &self.spec
    }

    fn analyze<'a>(&'a self, _input: AnalysisInput<'a>, _params: &'a BoundParams) -> ResultStream<'a> {
        yields(self.items.iter().map(|s| ResultItem::from(s.as_str())))
    }
}

/// Counts calls and remembers the filenames it was handed.
#[derive(Default)]
pub struct CallLog {
    calls: AtomicUsize,
    filenames: Mutex<Vec<String>>,
}

impl CallLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record(&self, input: &AnalysisInput<'_>) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let AnalysisInput::File { filename, .. } = input {
            self.filenames.lock().unwrap().push(filename.to_string());
        }
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn filenames(&self) -> Vec<String> {
        let mut names = self.filenames.lock().unwrap().clone();
        names.sort();
        names
    }
}

/// File bear reporting `filename:linecount`.
pub struct TestFileBear {
    spec: BearSpec,
    pub log: Arc<CallLog>,
}

impl TestFileBear {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            spec: BearSpec::file("TestFileBear"),
            log: CallLog::new(),
        })
    }
}

impl Bear for TestFileBear {
    fn spec(&self) -> &BearSpec {
        &self.spec
    }

    fn analyze<'a>(&'a self, input: AnalysisInput<'a>, _params: &'a BoundParams) -> ResultStream<'a> {
        self.log.record(&input);
        match input {
            AnalysisInput::File { filename, lines } => {
                yields([ResultItem::from(format!("{}:{}", filename, lines.len()))])
            }
            _ => fails(AnalysisError::failed("file bear handed a non-file unit")),
        }
    }
}

/// File bear yielding `filename0..filenameN` with N = `results_per_file`.
pub struct TestFileBearWithParameters {
    spec: BearSpec,
}

impl TestFileBearWithParameters {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            spec: BearSpec::file("TestFileBearWithParameters")
                .with_param(ParamSpec::optional("results_per_file", 1)),
        })
    }
}

impl Bear for TestFileBearWithParameters {
    fn spec(&self) -> &BearSpec {
        &self.spec
    }

    fn analyze<'a>(&'a self, input: AnalysisInput<'a>, params: &'a BoundParams) -> ResultStream<'a> {
        let count = params.int("results_per_file").unwrap_or(1);
        match input {
            AnalysisInput::File { filename, .. } => Box::new(
                (0..count).map(move |i| Ok::<_, AnalysisError>(ResultItem::from(format!("{filename}{i}")))),
            ),
            _ => fails(AnalysisError::failed("file bear handed a non-file unit")),
        }
    }
}

/// Project bear summarizing `name(linecount)` over sorted files.
pub struct TestProjectBear {
    spec: BearSpec,
    pub log: Arc<CallLog>,
}

impl TestProjectBear {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            spec: BearSpec::project("TestProjectBear"),
            log: CallLog::new(),
        })
    }
}

pub fn summarize(files: &FileSet) -> String {
    files
        .iter()
        .map(|(name, lines)| format!("{}({})", name, lines.len()))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Bear for TestProjectBear {
    fn spec(&self) -> &BearSpec {
        &self.spec
    }

    fn analyze<'a>(&'a self, input: AnalysisInput<'a>, _params: &'a BoundParams) -> ResultStream<'a> {
        self.log.record(&input);
        match input {
            AnalysisInput::Project { files } => yields([ResultItem::from(summarize(files))]),
            _ => fails(AnalysisError::failed("project bear handed a non-project unit")),
        }
    }
}

/// Dependent bear reporting `dependency - result`, or
/// `dependency (a_number) - result` when declared with a parameter.
pub struct EchoBear {
    spec: BearSpec,
    with_number: bool,
    pub log: Arc<CallLog>,
}

impl EchoBear {
    pub fn new(name: &str, dependencies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            spec: BearSpec::dependent(name, dependencies.iter().copied()),
            with_number: false,
            log: CallLog::new(),
        })
    }

    pub fn with_number(name: &str, dependencies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            spec: BearSpec::dependent(name, dependencies.iter().copied())
                .with_param(ParamSpec::optional("a_number", 100)),
            with_number: true,
            log: CallLog::new(),
        })
    }
}

impl Bear for EchoBear {
    fn spec(&self) -> &BearSpec {
        &self.spec
    }

    fn analyze<'a>(&'a self, input: AnalysisInput<'a>, params: &'a BoundParams) -> ResultStream<'a> {
        self.log.record(&input);
        let AnalysisInput::Dependency { bear, result } = input else {
            return fails(AnalysisError::failed("dependent bear handed a non-dependency unit"));
        };
        let line = if self.with_number {
            let number = params.int("a_number").unwrap_or_default();
            format!("{} ({}) - {}", bear.name(), number, result)
        } else {
            format!("{} - {}", bear.name(), result)
        };
        yields([ResultItem::from(line)])
    }
}

/// How a [`FaultyFileBear`] misbehaves on its trigger file.
#[derive(Clone, Copy)]
pub enum Fault {
    /// Yield one item, then fail.
    FailAfterOne,
    Panic,
    Sleep(Duration),
}

/// File bear that yields `filename` for every file and misbehaves on `trigger`.
pub struct FaultyFileBear {
    spec: BearSpec,
    trigger: String,
    fault: Fault,
}

impl FaultyFileBear {
    pub fn new(name: &str, trigger: &str, fault: Fault) -> Arc<Self> {
        Arc::new(Self {
            spec: BearSpec::file(name),
            trigger: trigger.to_string(),
            fault,
        })
    }
}

impl Bear for FaultyFileBear {
    fn spec(&self) -> &BearSpec {
        &self.spec
    }

    fn analyze<'a>(&'a self, input: AnalysisInput<'a>, _params: &'a BoundParams) -> ResultStream<'a> {
        let AnalysisInput::File { filename, .. } = input else {
            return fails(AnalysisError::failed("file bear handed a non-file unit"));
        };
        if filename != self.trigger {
            return yields([ResultItem::from(filename)]);
        }
        match self.fault {
            Fault::FailAfterOne => Box::new(
                [
                    Ok(ResultItem::from(format!("{filename}-partial"))),
                    Err(AnalysisError::failed(format!("cannot parse {filename}"))),
                    Ok(ResultItem::from("never delivered")),
                ]
                .into_iter(),
            ),
            Fault::Panic => panic!("bear exploded on {filename}"),
            Fault::Sleep(duration) => {
                thread::sleep(duration);
                yields([ResultItem::from(format!("{filename}-late"))])
            }
        }
    }
}

/// File bear that takes `delay` on every file before yielding its name.
pub struct SlowFileBear {
    spec: BearSpec,
    delay: Duration,
}

impl SlowFileBear {
    pub fn new(name: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            spec: BearSpec::file(name),
            delay,
        })
    }
}

impl Bear for SlowFileBear {
    fn spec(&self) -> &BearSpec {
        &self.spec
    }

    fn analyze<'a>(&'a self, input: AnalysisInput<'a>, _params: &'a BoundParams) -> ResultStream<'a> {
        let AnalysisInput::File { filename, .. } = input else {
            return fails(AnalysisError::failed("file bear handed a non-file unit"));
        };
        thread::sleep(self.delay);
        yields([ResultItem::from(filename)])
    }
}
