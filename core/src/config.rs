//! Dispatch configuration types

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Default idle timeout before an elastic worker expires
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(1);

/// How work items are spread across workers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolStrategy {
    /// A static set of workers pulling from a shared job channel
    #[default]
    Fixed,
    /// Workers register when idle and expire after the idle timeout
    Elastic,
    /// A single consumer running in the dispatcher's own task
    Sequential,
}

impl PoolStrategy {
    /// Lowercase name, as accepted by `from_str`
    pub fn as_str(&self) -> &'static str {
        match self {
            PoolStrategy::Fixed => "fixed",
            PoolStrategy::Elastic => "elastic",
            PoolStrategy::Sequential => "sequential",
        }
    }
}

impl fmt::Display for PoolStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PoolStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(PoolStrategy::Fixed),
            "elastic" => Ok(PoolStrategy::Elastic),
            "sequential" => Ok(PoolStrategy::Sequential),
            other => Err(ConfigError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Dispatch configuration
///
/// Describes one batch run: how many requests, how many workers, which
/// target and which pool strategy drains the job stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Worker count (the cap on live workers for the elastic pool)
    pub workers: usize,

    /// Total number of requests to issue
    pub jobs: usize,

    /// Target URL for every request
    pub target: String,

    /// Pool strategy
    #[serde(default)]
    pub strategy: PoolStrategy,

    /// Idle time after which an elastic worker terminates
    pub idle_timeout: Duration,

    /// Per-request timeout enforced by the HTTP client
    pub request_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            jobs: 20,
            target: String::new(),
            strategy: PoolStrategy::default(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl DispatchConfig {
    /// Create a new config for `jobs` requests against `target` using `workers` workers
    pub fn new(workers: usize, jobs: usize, target: impl Into<String>) -> Self {
        Self {
            workers,
            jobs,
            target: target.into(),
            ..Default::default()
        }
    }

    /// Set the pool strategy
    pub fn with_strategy(mut self, strategy: PoolStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the elastic idle timeout
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the per-request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Parse the target into a URL
    pub fn target_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.target)
            .map_err(|e| ConfigError::InvalidTarget(format!("{}: {}", self.target, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(ConfigError::InvalidTarget(format!(
                "unsupported scheme '{scheme}'"
            ))),
        }
    }

    /// Validate the configuration
    ///
    /// A job count of zero is valid and drains immediately.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkers(
                "worker count must be at least 1".into(),
            ));
        }

        if self.idle_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "idle timeout must be positive".into(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "request timeout must be positive".into(),
            ));
        }

        self.target_url()?;

        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid worker count
    #[error("Invalid workers: {0}")]
    InvalidWorkers(String),

    /// Invalid channel buffer size
    #[error("Invalid buffer: {0}")]
    InvalidBuffer(String),

    /// Target is not a usable URL
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// Zero or otherwise unusable timeout
    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),

    /// Unrecognised pool strategy name
    #[error("Unknown pool strategy: {0}")]
    UnknownStrategy(String),
}
