//! The engine entry point: resolves the dependency graph for a request and
//! drives it to completion on the configured executor.

mod run;


use std::sync::Arc;

use tracing::info;
use ursa_core::{BearInstance, EngineConfig};

use crate::collector::{Output, RunReport};
use crate::error::EngineError;
use crate::executor::{self, Executor};
use crate::graph::DependencyGraph;
use crate::registry::BearRegistry;

use run::Run;

/// Runs bear instances and their dependencies to completion.
pub struct Engine {
    config: EngineConfig,
    registry: BearRegistry,
    executor: Arc<dyn Executor>,
}

impl Engine {
    /// Create an engine with the executor selected by `config`.
    pub fn new(config: EngineConfig, registry: BearRegistry) -> Result<Self, EngineError> {
        config.validate()?;
        let executor = executor::from_config(&config)?;
        info!(bears = registry.len(), "engine initialized");
        Ok(Self {
            config,
            registry,
            executor,
        })
    }

    /// Replace the executor backend.
    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        executor::warn_if_timeout_ignored(&self.config, executor.as_ref());
        self.executor = executor;
        self
    }

    pub fn registry(&self) -> &BearRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run `instances` and return everything they produced.
    ///
    /// Blocks until every instance (including pulled-in dependencies) has
    /// completed or the run was aborted. Configuration problems and
    /// dependency cycles fail the whole request before any unit runs.
    pub fn run(&self, instances: Vec<BearInstance>) -> Result<RunReport, EngineError> {
        self.run_with(instances, |_| {})
    }

    /// Like [`Engine::run`], calling `on_output` for each record as it is
    /// collected.
    pub fn run_with<F>(&self, instances: Vec<BearInstance>, on_output: F) -> Result<RunReport, EngineError>
    where
        F: FnMut(&Output),
    {
        let graph = DependencyGraph::build(instances, &self.registry)?;
        let run = Run::new(&graph, Arc::clone(&self.executor), &self.config, on_output);
        Ok(run.execute())
    }
}
