use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = env_opt(key)?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable environment override");
            None
        }
    }
}

/// Which worker pool runs work units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorKind {
    /// Bounded rayon thread pool.
    #[default]
    ThreadPool,
    /// Run every unit on the coordinating thread as it is dispatched.
    Inline,
}

impl FromStr for ExecutorKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "thread_pool" | "threads" | "pool" => Ok(ExecutorKind::ThreadPool),
            "inline" | "sequential" => Ok(ExecutorKind::Inline),
            other => Err(ConfigurationError::Engine(format!(
                "unknown executor '{other}', expected 'thread_pool' or 'inline'"
            ))),
        }
    }
}

impl fmt::Display for ExecutorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutorKind::ThreadPool => f.write_str("thread_pool"),
            ExecutorKind::Inline => f.write_str("inline"),
        }
    }
}

/// Engine configuration, typically parsed from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Number of worker threads. 0 = available parallelism.
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
    #[serde(default)]
    pub executor: ExecutorKind,
    /// Per-unit timeout in milliseconds. Unset = no timeout.
    #[serde(default)]
    pub unit_timeout_ms: Option<u64>,
    /// Stop dispatching new units after the first analysis failure.
    #[serde(default)]
    pub abort_on_failure: bool,
}

fn default_worker_threads() -> usize {
    0
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_threads: default_worker_threads(),
            executor: ExecutorKind::default(),
            unit_timeout_ms: None,
            abort_on_failure: false,
        }
    }
}

impl EngineConfig {
    /// Parse config from a TOML string, then apply environment overrides.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigurationError> {
        let mut config: Self = toml::from_str(toml_str)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load config from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Defaults plus environment overrides (call `load_dotenv()` first).
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `URSA_*` environment variables.
    pub fn apply_env_overrides(&mut self) {
        if let Some(threads) = env_parse("URSA_WORKER_THREADS") {
            self.worker_threads = threads;
        }
        if let Some(kind) = env_parse("URSA_EXECUTOR") {
            self.executor = kind;
        }
        if let Some(ms) = env_parse("URSA_UNIT_TIMEOUT_MS") {
            self.unit_timeout_ms = Some(ms);
        }
        if let Some(abort) = env_parse("URSA_ABORT_ON_FAILURE") {
            self.abort_on_failure = abort;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.unit_timeout_ms == Some(0) {
            return Err(ConfigurationError::Engine(
                "unit_timeout_ms must be positive; omit it to disable timeouts".into(),
            ));
        }
        Ok(())
    }

    /// Resolve worker thread count (0 means use available parallelism).
    pub fn resolved_worker_threads(&self) -> usize {
        if self.worker_threads == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            self.worker_threads
        }
    }

    pub fn unit_timeout(&self) -> Option<Duration> {
        self.unit_timeout_ms.map(Duration::from_millis)
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!(
            executor = %self.executor,
            workers = self.resolved_worker_threads(),
            timeout_ms = ?self.unit_timeout_ms,
            abort_on_failure = self.abort_on_failure,
            "engine config loaded"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.worker_threads, 0);
        assert_eq!(config.executor, ExecutorKind::ThreadPool);
        assert_eq!(config.unit_timeout(), None);
        assert!(!config.abort_on_failure);
    }

    #[test]
    fn resolved_worker_threads() {
        let mut config = EngineConfig::default();
        // 0 means auto-detect
        assert!(config.resolved_worker_threads() > 0);

        config.worker_threads = 8;
        assert_eq!(config.resolved_worker_threads(), 8);
    }

    #[test]
    fn parse_minimal_toml() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn parse_full_toml() {
        let config: EngineConfig = toml::from_str(
            r#"
worker_threads = 8
executor = "inline"
unit_timeout_ms = 2500
abort_on_failure = true
"#,
        )
        .unwrap();
        assert_eq!(config.worker_threads, 8);
        assert_eq!(config.executor, ExecutorKind::Inline);
        assert_eq!(config.unit_timeout(), Some(Duration::from_millis(2500)));
        assert!(config.abort_on_failure);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = EngineConfig {
            unit_timeout_ms: Some(0),
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigurationError::Engine(_))));
    }

    #[test]
    fn unknown_executor_is_rejected() {
        assert!(toml::from_str::<EngineConfig>(r#"executor = "processes""#).is_err());
        assert!("processes".parse::<ExecutorKind>().is_err());
        assert_eq!("Sequential".parse::<ExecutorKind>().unwrap(), ExecutorKind::Inline);
    }
}
