//! Pluggable worker backends. Scheduling semantics do not depend on which
//! one runs the units.

use std::sync::Arc;

use tracing::{info, warn};
use ursa_core::{EngineConfig, ExecutorKind};

use crate::error::EngineError;

/// A boxed unit of work handed to an executor.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

pub trait Executor: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &'static str;

    /// Number of units that may run at once.
    fn workers(&self) -> usize;

    /// Run `job`, now or later, on some worker.
    fn spawn(&self, job: Job);

    /// Whether the coordinator can give up on a running unit. False when
    /// jobs run on the coordinator's own thread.
    fn enforces_timeouts(&self) -> bool {
        true
    }
}

/// Bounded rayon thread pool.
pub struct ThreadPoolExecutor {
    pool: rayon::ThreadPool,
}

impl ThreadPoolExecutor {
    pub fn new(threads: usize) -> Result<Self, EngineError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("ursa-worker-{i}"))
            .build()
            .map_err(|e| EngineError::Executor(format!("failed to build thread pool: {e}")))?;
        Ok(Self { pool })
    }
}

impl Executor for ThreadPoolExecutor {
    fn name(&self) -> &'static str {
        "thread_pool"
    }

    fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    fn spawn(&self, job: Job) {
        self.pool.spawn(job);
    }
}

/// Runs every job on the calling thread, immediately.
///
/// Timeouts cannot preempt inline units.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn name(&self) -> &'static str {
        "inline"
    }

    fn workers(&self) -> usize {
        1
    }

    fn spawn(&self, job: Job) {
        job();
    }

    fn enforces_timeouts(&self) -> bool {
        false
    }
}

/// Build the executor selected by `config`.
pub fn from_config(config: &EngineConfig) -> Result<Arc<dyn Executor>, EngineError> {
    let executor: Arc<dyn Executor> = match config.executor {
        ExecutorKind::ThreadPool => Arc::new(ThreadPoolExecutor::new(config.resolved_worker_threads())?),
        ExecutorKind::Inline => Arc::new(InlineExecutor),
    };
    info!(executor = executor.name(), workers = executor.workers(), "executor ready");
    warn_if_timeout_ignored(config, executor.as_ref());
    Ok(executor)
}

/// Warn when `config` sets a unit timeout that `executor` cannot enforce.
/// Returns whether the timeout is ignored.
pub(crate) fn warn_if_timeout_ignored(config: &EngineConfig, executor: &dyn Executor) -> bool {
    let ignored = config.unit_timeout_ms.is_some() && !executor.enforces_timeouts();
    if ignored {
        warn!(
            executor = executor.name(),
            unit_timeout_ms = ?config.unit_timeout_ms,
            "unit timeout has no effect on this executor"
        );
    }
    ignored
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn thread_pool_runs_jobs() {
        let executor = ThreadPoolExecutor::new(2).unwrap();
        assert_eq!(executor.workers(), 2);

        let (tx, rx) = mpsc::channel();
        for i in 0..10 {
            let tx = tx.clone();
            executor.spawn(Box::new(move || {
                tx.send(i).unwrap();
            }));
        }
        drop(tx);
        let mut seen: Vec<i32> = rx.iter().collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn inline_runs_before_returning() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        InlineExecutor.spawn(Box::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn from_config_honors_kind() {
        let mut config = EngineConfig {
            worker_threads: 3,
            ..EngineConfig::default()
        };
        assert_eq!(from_config(&config).unwrap().workers(), 3);

        config.executor = ExecutorKind::Inline;
        assert_eq!(from_config(&config).unwrap().name(), "inline");
    }

    #[test]
    fn inline_cannot_enforce_timeouts() {
        let config = EngineConfig {
            unit_timeout_ms: Some(100),
            ..EngineConfig::default()
        };
        let pool = ThreadPoolExecutor::new(1).unwrap();
        assert!(!warn_if_timeout_ignored(&config, &pool));
        assert!(warn_if_timeout_ignored(&config, &InlineExecutor));

        let untimed = EngineConfig::default();
        assert!(!warn_if_timeout_ignored(&untimed, &InlineExecutor));
    }
}
