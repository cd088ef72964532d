//! HTTP request execution
//!
//! [`HttpExecutor`] issues one GET per work item through a single shared
//! reqwest client. Certificate verification is disabled and only HTTP/1.1 is
//! spoken. Response bodies are drained so connections go back to the pool.

use std::error::Error as StdError;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use reqwest::Client;

use crate::clock::Clock;
use crate::job::WorkItem;
use crate::response::{Outcome, RequestTrace};
use crate::traits::{RequestError, RequestExecutor};

type BoxError = Box<dyn StdError + Send + Sync>;

/// Counters for DNS lookups made while dialing new connections
///
/// Pooled connections skip resolution, so these only describe connections
/// that had to be established from scratch.
#[derive(Debug, Default)]
pub struct DialStats {
    lookups: AtomicU64,
    lookup_nanos: AtomicU64,
}

impl DialStats {
    fn record(&self, took: Duration) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.lookup_nanos
            .fetch_add(took.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Number of lookups performed
    pub fn lookups(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }

    /// Cumulative time spent resolving
    pub fn lookup_time(&self) -> Duration {
        Duration::from_nanos(self.lookup_nanos.load(Ordering::Relaxed))
    }

    /// Mean lookup time, if any lookup happened
    pub fn mean_lookup_time(&self) -> Option<Duration> {
        match self.lookups() {
            0 => None,
            n => Some(self.lookup_time() / n as u32),
        }
    }
}

/// DNS resolver that times every lookup against the reference clock
#[derive(Debug)]
pub struct TimingResolver {
    clock: Arc<dyn Clock>,
    stats: Arc<DialStats>,
}

impl TimingResolver {
    /// Create a resolver reporting into `stats`
    pub fn new(clock: Arc<dyn Clock>, stats: Arc<DialStats>) -> Self {
        Self { clock, stats }
    }
}

impl Resolve for TimingResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let clock = Arc::clone(&self.clock);
        let stats = Arc::clone(&self.stats);
        Box::pin(lookup(name, clock, stats))
    }
}

async fn lookup(
    name: Name,
    clock: Arc<dyn Clock>,
    stats: Arc<DialStats>,
) -> Result<Addrs, BoxError> {
    let started = clock.now();
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((name.as_str(), 0))
        .await?
        .collect();
    let took = clock.since(started);
    stats.record(took);
    tracing::trace!(
        host = name.as_str(),
        addrs = addrs.len(),
        dns_us = took.as_micros() as u64,
        "DNS lookup finished"
    );
    Ok(Box::new(addrs.into_iter()))
}

/// Executes work items as HTTP GET requests
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: Client,
    clock: Arc<dyn Clock>,
    dial_stats: Arc<DialStats>,
}

impl HttpExecutor {
    /// Build an executor with the given per-request timeout
    pub fn new(timeout: Duration, clock: Arc<dyn Clock>) -> Result<Self, reqwest::Error> {
        let dial_stats = Arc::new(DialStats::default());
        let resolver = TimingResolver::new(Arc::clone(&clock), Arc::clone(&dial_stats));

        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(true)
            .http1_only()
            .dns_resolver(Arc::new(resolver))
            .build()?;

        Ok(Self {
            client,
            clock,
            dial_stats,
        })
    }

    /// DNS statistics for connections this executor dialed
    pub fn dial_stats(&self) -> Arc<DialStats> {
        Arc::clone(&self.dial_stats)
    }

    async fn fetch(&self, item: &WorkItem) -> Result<RequestTrace, RequestError> {
        let started_at = self.clock.now();
        let mut response = self.client.get(item.target().clone()).send().await?;
        let first_byte = self.clock.since(started_at);
        let status = response.status();

        let mut body_bytes = 0;
        while let Some(chunk) = response.chunk().await? {
            body_bytes += chunk.len();
        }

        if status.is_client_error() || status.is_server_error() {
            return Err(RequestError::Status(status.as_u16()));
        }

        Ok(RequestTrace {
            started_at,
            first_byte,
            total: self.clock.since(started_at),
            body_bytes,
        })
    }
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    async fn execute(&self, item: &WorkItem) -> Result<Outcome, RequestError> {
        tracing::trace!(job_id = item.id(), "Start processing job");
        let trace = self.fetch(item).await?;
        tracing::trace!(
            job_id = item.id(),
            first_byte_ms = trace.first_byte.as_secs_f64() * 1000.0,
            total_ms = trace.total.as_secs_f64() * 1000.0,
            body_bytes = trace.body_bytes,
            "End processing job"
        );
        Ok(Outcome::new(item.id(), trace.total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MonotonicClock;
    use crate::testing::{unreachable_url, TestServer};
    use reqwest::Url;

    fn executor() -> HttpExecutor {
        HttpExecutor::new(Duration::from_secs(5), Arc::new(MonotonicClock::new()))
            .expect("Failed to build executor")
    }

    fn item(url: &str) -> WorkItem {
        WorkItem::new(3, Arc::new(Url::parse(url).unwrap()))
    }

    #[tokio::test]
    async fn test_execute_success() {
        let server = TestServer::start().await;
        let outcome = executor()
            .execute(&item(&server.url()))
            .await
            .expect("Request failed");

        assert_eq!(outcome.job_id, 3);
        assert_eq!(server.hits(), 1);
    }

    #[tokio::test]
    async fn test_execute_server_error_is_failure() {
        let server = TestServer::with_status(503).await;
        let result = executor().execute(&item(&server.url())).await;

        assert!(matches!(result, Err(RequestError::Status(503))));
        assert_eq!(server.hits(), 1);
    }

    #[tokio::test]
    async fn test_execute_unreachable_is_transport_error() {
        let url = unreachable_url().await;
        let result = executor().execute(&item(&url)).await;

        let err = result.expect_err("Request should fail");
        assert!(matches!(err, RequestError::Transport(_)));
        assert!(!err.is_timeout());
    }

    #[tokio::test]
    async fn test_execute_timeout() {
        let server = TestServer::with_delay(Duration::from_millis(500)).await;
        let executor =
            HttpExecutor::new(Duration::from_millis(50), Arc::new(MonotonicClock::new()))
                .expect("Failed to build executor");

        let err = executor
            .execute(&item(&server.url()))
            .await
            .expect_err("Request should time out");
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_resolver_times_lookups() {
        let server = TestServer::start().await;
        let executor = executor();
        let url = format!("http://localhost:{}/", server.port());

        for _ in 0..5 {
            executor.execute(&item(&url)).await.expect("Request failed");
        }

        assert_eq!(server.hits(), 5);
        // pooled connections skip resolution
        let lookups = executor.dial_stats().lookups();
        assert!((1..=5).contains(&lookups));
        assert!(executor.dial_stats().mean_lookup_time().is_some());
    }

    #[test]
    fn test_dial_stats_empty() {
        let stats = DialStats::default();
        assert_eq!(stats.lookups(), 0);
        assert_eq!(stats.lookup_time(), Duration::ZERO);
        assert!(stats.mean_lookup_time().is_none());
    }
}
