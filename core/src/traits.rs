//! Core traits for request execution
//!
//! Workers only see a `RequestExecutor`; the HTTP implementation lives in
//! [`crate::request`] and tests substitute their own.

use async_trait::async_trait;

use crate::job::WorkItem;
use crate::response::Outcome;

/// Performs the request described by one work item
///
/// Implementations are shared across every worker task via `Arc` and must be
/// safe for concurrent use. A failed request yields an error and no
/// [`Outcome`]; callers never retry.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    /// Execute one request
    async fn execute(&self, item: &WorkItem) -> Result<Outcome, RequestError>;
}

/// Per-request failures
///
/// These never escape the worker that observed them: the request is dropped
/// from the completed count and logged.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// Connection, timeout or protocol failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a 4xx or 5xx status
    #[error("server responded with status {0}")]
    Status(u16),
}

impl RequestError {
    /// Whether the failure came from a request timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, RequestError::Transport(e) if e.is_timeout())
    }
}
