//! Per-worker tallies

use std::time::{Duration, Instant};

use crate::response::Outcome;
use crate::traits::RequestError;

/// What one worker saw during its lifetime
///
/// Diagnostic only. The result sink owns the authoritative completed count.
#[derive(Debug, Default, Clone)]
pub struct WorkerStats {
    /// Requests that produced an outcome
    pub completed: usize,

    /// Requests that failed and were dropped
    pub errors: usize,

    /// Subset of `errors` caused by the request timeout
    pub timeouts: usize,

    /// Summed latency of completed requests
    pub busy: Duration,

    /// When the worker took its first item
    pub started_at: Option<Instant>,

    /// When the worker exited
    pub ended_at: Option<Instant>,
}

impl WorkerStats {
    /// Create new empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the start of the worker's life
    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    /// Mark the end of the worker's life
    pub fn stop(&mut self) {
        self.ended_at = Some(Instant::now());
    }

    /// Items this worker pulled, successful or not
    pub fn total_requests(&self) -> usize {
        self.completed + self.errors
    }

    /// Lifetime so far, or the full lifetime once stopped
    pub fn elapsed(&self) -> Option<Duration> {
        let start = self.started_at?;
        Some(match self.ended_at {
            Some(end) => end.duration_since(start),
            None => start.elapsed(),
        })
    }

    /// Mean latency of completed requests
    pub fn mean_latency(&self) -> Option<Duration> {
        match self.completed {
            0 => None,
            n => Some(self.busy / n as u32),
        }
    }

    /// Count a successful request
    pub fn record_success(&mut self, outcome: &Outcome) {
        self.completed += 1;
        self.busy += outcome.latency;
    }

    /// Count a dropped request
    pub fn record_failure(&mut self, error: &RequestError) {
        self.errors += 1;
        if error.is_timeout() {
            self.timeouts += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_stats_defaults() {
        let stats = WorkerStats::default();
        assert_eq!(stats.total_requests(), 0);
        assert!(stats.elapsed().is_none());
        assert!(stats.mean_latency().is_none());
    }

    #[test]
    fn test_records_outcomes_and_failures() {
        let mut stats = WorkerStats::new();
        stats.record_success(&Outcome::new(0, Duration::from_millis(30)));
        stats.record_success(&Outcome::new(1, Duration::from_millis(10)));
        stats.record_failure(&RequestError::Status(502));

        assert_eq!(stats.completed, 2);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.timeouts, 0);
        assert_eq!(stats.total_requests(), 3);
        assert_eq!(stats.busy, Duration::from_millis(40));
        assert_eq!(stats.mean_latency(), Some(Duration::from_millis(20)));
    }

    #[test]
    fn test_lifetime() {
        let mut stats = WorkerStats::new();
        stats.start();
        std::thread::sleep(Duration::from_millis(10));
        stats.stop();

        let elapsed = stats.elapsed().unwrap();
        assert!(elapsed >= Duration::from_millis(10));
        assert_eq!(stats.elapsed(), Some(elapsed));
    }
}
