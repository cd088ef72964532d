//! Error types for gab-core

use thiserror::Error;

use crate::config::ConfigError;

/// Core error type
#[derive(Error, Debug)]
pub enum GabError {
    /// Configuration failed validation
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A required builder field was never set
    #[error("missing configuration: {0}")]
    MissingConfig(&'static str),

    /// A worker task failed or panicked
    #[error("worker error: {0}")]
    Worker(String),

    /// The dispatch pipeline broke down before draining
    #[error("dispatch error: {0}")]
    Dispatch(String),

    /// `run` was called on a dispatcher that already drained
    #[error("dispatcher has already run")]
    AlreadyRun,

    /// The HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl GabError {
    /// Create a missing configuration error
    pub fn missing_config(field: &'static str) -> Self {
        Self::MissingConfig(field)
    }

    /// Create a worker error
    pub fn worker(msg: impl Into<String>) -> Self {
        Self::Worker(msg.into())
    }

    /// Create a dispatch error
    pub fn dispatch(msg: impl Into<String>) -> Self {
        Self::Dispatch(msg.into())
    }
}

/// Result type alias
pub type GabResult<T> = std::result::Result<T, GabError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_message() {
        let err = GabError::missing_config("executor");
        assert_eq!(err.to_string(), "missing configuration: executor");
    }

    #[test]
    fn test_config_error_converts() {
        let err: GabError = ConfigError::InvalidWorkers("must be at least 1".into()).into();
        assert!(matches!(err, GabError::Config(_)));
        assert!(err.to_string().contains("must be at least 1"));
    }
}
