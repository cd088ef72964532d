//! Result sink and run-level aggregation

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use crate::config::PoolStrategy;
use crate::elastic::PoolSnapshot;
use crate::response::Outcome;
use crate::worker::WorkerStats;

/// Drain the result channel, then report how many outcomes arrived
///
/// Returns only after every result sender has been dropped. The count is
/// sent through `done` exactly once.
pub async fn gather_results(mut rx: mpsc::Receiver<Outcome>, done: oneshot::Sender<u64>) {
    let mut completed: u64 = 0;
    while rx.recv().await.is_some() {
        completed += 1;
    }

    tracing::debug!(completed, "Result channel drained");

    if done.send(completed).is_err() {
        tracing::warn!("Completion signal dropped before the count was reported");
    }
}

/// Requests per second for a finished run
///
/// Runs shorter than one second report the raw count.
pub fn throughput(completed: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs < 1.0 {
        completed as f64
    } else {
        completed as f64 / secs
    }
}

/// Worker-side tallies summed across a pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerTotals {
    /// Number of workers that reported
    pub workers: usize,

    /// Requests that succeeded
    pub completed: usize,

    /// Requests that failed and were dropped
    pub errors: usize,

    /// Failures caused by the request timeout
    pub timeouts: usize,
}

impl WorkerTotals {
    /// Get the total number of requests attempted
    pub fn total_requests(&self) -> usize {
        self.completed + self.errors
    }
}

/// Sum per-worker statistics
pub fn aggregate_worker_stats(stats: &[WorkerStats]) -> WorkerTotals {
    WorkerTotals {
        workers: stats.len(),
        completed: stats.iter().map(|s| s.completed).sum(),
        errors: stats.iter().map(|s| s.errors).sum(),
        timeouts: stats.iter().map(|s| s.timeouts).sum(),
    }
}

/// Final figures of one dispatcher run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Strategy that drained the jobs
    pub strategy: PoolStrategy,

    /// Requested workers
    pub workers: usize,

    /// Requested jobs
    pub jobs: usize,

    /// Successful responses counted by the result sink
    pub completed: u64,

    /// Wall-clock time from start to full drain
    pub elapsed: Duration,

    /// Requests per second
    pub qps: f64,

    /// Elastic pool counters, if the elastic strategy ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<PoolSnapshot>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "total requests={}, total seconds={:.2}",
            self.completed,
            self.elapsed.as_secs_f64()
        )?;
        write!(f, "QPS={:.1}", self.qps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throughput_short_run_reports_count() {
        assert_eq!(throughput(10, Duration::from_millis(400)), 10.0);
        assert_eq!(throughput(0, Duration::ZERO), 0.0);
    }

    #[test]
    fn test_throughput_long_run_divides() {
        assert_eq!(throughput(100, Duration::from_secs(4)), 25.0);
        assert_eq!(throughput(3, Duration::from_secs(1)), 3.0);
    }

    #[test]
    fn test_aggregate_worker_stats() {
        let mut a = WorkerStats::new();
        a.completed = 4;
        a.errors = 1;
        a.timeouts = 1;
        let mut b = WorkerStats::new();
        b.completed = 6;

        let totals = aggregate_worker_stats(&[a, b]);
        assert_eq!(totals.workers, 2);
        assert_eq!(totals.completed, 10);
        assert_eq!(totals.errors, 1);
        assert_eq!(totals.timeouts, 1);
        assert_eq!(totals.total_requests(), 11);

        assert_eq!(aggregate_worker_stats(&[]), WorkerTotals::default());
    }

    #[test]
    fn test_summary_display() {
        let summary = RunSummary {
            strategy: PoolStrategy::Fixed,
            workers: 5,
            jobs: 20,
            completed: 20,
            elapsed: Duration::from_millis(2500),
            qps: 8.0,
            pool: None,
        };
        assert_eq!(
            summary.to_string(),
            "total requests=20, total seconds=2.50\nQPS=8.0"
        );
    }

    #[test]
    fn test_summary_serializes_without_pool() {
        let summary = RunSummary {
            strategy: PoolStrategy::Elastic,
            workers: 2,
            jobs: 4,
            completed: 4,
            elapsed: Duration::from_millis(10),
            qps: 4.0,
            pool: None,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["strategy"], "elastic");
        assert!(json.get("pool").is_none());
    }

    #[tokio::test]
    async fn test_gather_results_counts_until_closed() {
        let (tx, rx) = mpsc::channel(2);
        let (done_tx, done_rx) = oneshot::channel();
        let sink = tokio::spawn(gather_results(rx, done_tx));

        for id in 0..5 {
            tx.send(Outcome::new(id, Duration::ZERO)).await.unwrap();
        }
        let second = tx.clone();
        drop(tx);
        second.send(Outcome::new(5, Duration::ZERO)).await.unwrap();
        drop(second);

        assert_eq!(done_rx.await.unwrap(), 6);
        sink.await.unwrap();
    }

    #[tokio::test]
    async fn test_gather_results_empty_channel() {
        let (tx, rx) = mpsc::channel::<Outcome>(1);
        let (done_tx, done_rx) = oneshot::channel();
        drop(tx);

        gather_results(rx, done_tx).await;
        assert_eq!(done_rx.await.unwrap(), 0);
    }
}
