//! Builder pattern for Worker construction

use crate::error::{GabError, GabResult};
use crate::response::Outcome;
use crate::traits::RequestExecutor;

use super::executor::{SharedJobs, Worker};

use std::sync::Arc;
use tokio::sync::mpsc;

/// Builder for creating Worker instances
///
/// # Example
/// ```ignore
/// let worker = WorkerBuilder::new(0)
///     .executor(executor)
///     .jobs(jobs)
///     .results_tx(tx)
///     .build()?;
/// ```
pub struct WorkerBuilder {
    id: usize,
    executor: Option<Arc<dyn RequestExecutor>>,
    jobs: Option<SharedJobs>,
    results_tx: Option<mpsc::Sender<Outcome>>,
}

impl WorkerBuilder {
    /// Create a new builder with the given worker ID
    pub fn new(id: usize) -> Self {
        Self {
            id,
            executor: None,
            jobs: None,
            results_tx: None,
        }
    }

    /// Set the request executor
    pub fn executor(mut self, executor: Arc<dyn RequestExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Set the shared job receiver
    pub fn jobs(mut self, jobs: SharedJobs) -> Self {
        self.jobs = Some(jobs);
        self
    }

    /// Set the result channel sender
    pub fn results_tx(mut self, tx: mpsc::Sender<Outcome>) -> Self {
        self.results_tx = Some(tx);
        self
    }

    /// Build the Worker
    ///
    /// # Errors
    /// Returns an error if any required field is missing.
    pub fn build(self) -> GabResult<Worker> {
        let executor = self.executor.ok_or(GabError::missing_config("executor"))?;
        let jobs = self.jobs.ok_or(GabError::missing_config("jobs"))?;
        let results_tx = self
            .results_tx
            .ok_or(GabError::missing_config("results_tx"))?;

        Ok(Worker::new(self.id, executor, jobs, results_tx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockExecutor;
    use tokio::sync::Mutex;

    fn shared_jobs() -> SharedJobs {
        let (_tx, rx) = mpsc::channel(1);
        Arc::new(Mutex::new(rx))
    }

    #[test]
    fn test_builder_missing_executor() {
        let (tx, _rx) = mpsc::channel(1);
        let result = WorkerBuilder::new(0).jobs(shared_jobs()).results_tx(tx).build();

        let err = result.unwrap_err();
        assert!(matches!(err, GabError::MissingConfig("executor")));
    }

    #[test]
    fn test_builder_missing_jobs() {
        let (tx, _rx) = mpsc::channel(1);
        let result = WorkerBuilder::new(0)
            .executor(Arc::new(MockExecutor::new()))
            .results_tx(tx)
            .build();

        assert!(matches!(result, Err(GabError::MissingConfig("jobs"))));
    }

    #[test]
    fn test_builder_missing_results_tx() {
        let result = WorkerBuilder::new(0)
            .executor(Arc::new(MockExecutor::new()))
            .jobs(shared_jobs())
            .build();

        assert!(matches!(result, Err(GabError::MissingConfig("results_tx"))));
    }

    #[test]
    fn test_builder_complete() {
        let (tx, _rx) = mpsc::channel(1);
        let worker = WorkerBuilder::new(7)
            .executor(Arc::new(MockExecutor::new()))
            .jobs(shared_jobs())
            .results_tx(tx)
            .build()
            .expect("Failed to build worker");

        assert_eq!(worker.id(), 7);
    }
}
