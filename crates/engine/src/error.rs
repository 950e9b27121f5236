use thiserror::Error;
use ursa_core::ConfigurationError;

/// Errors that abort a whole execution request before any unit is dispatched.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("circular bear dependency: {0}")]
    CyclicDependency(String),

    #[error("executor error: {0}")]
    Executor(String),
}
