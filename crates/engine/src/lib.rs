mod cache;
pub mod collector;
pub mod error;
pub mod executor;
pub mod expand;
pub mod graph;
pub mod metrics;
pub mod registry;
pub mod scheduler;

#[cfg(test)]
mod testing;

pub use collector::{FailureRecord, Output, ResultRecord, RunReport};
pub use error::EngineError;
pub use executor::{Executor, InlineExecutor, Job, ThreadPoolExecutor};
pub use graph::{DependencyGraph, InstanceId};
pub use metrics::RunStats;
pub use registry::BearRegistry;
pub use scheduler::Engine;
