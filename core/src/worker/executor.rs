//! Worker execution loop

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::job::WorkItem;
use crate::response::Outcome;
use crate::traits::RequestExecutor;

use super::stats::WorkerStats;

/// Job receiver shared by every worker of a fixed pool
pub type SharedJobs = Arc<Mutex<mpsc::Receiver<WorkItem>>>;

/// Worker executes requests in a loop: pull -> execute -> report -> repeat
///
/// Stops once the job channel is closed and empty.
pub struct Worker {
    /// Worker identifier, unique within its pool
    id: usize,

    /// Request executor (shared across workers via Arc)
    executor: Arc<dyn RequestExecutor>,

    /// Job channel consumer end
    jobs: SharedJobs,

    /// Channel sender for outcomes
    results_tx: mpsc::Sender<Outcome>,
}

impl Worker {
    /// Create a new worker
    pub fn new(
        id: usize,
        executor: Arc<dyn RequestExecutor>,
        jobs: SharedJobs,
        results_tx: mpsc::Sender<Outcome>,
    ) -> Self {
        Self {
            id,
            executor,
            jobs,
            results_tx,
        }
    }

    /// Run the worker loop until the job channel drains
    pub async fn run(self) -> WorkerStats {
        let mut stats = WorkerStats::new();
        stats.start();

        tracing::debug!(worker_id = self.id, "Worker started");

        while let Some(item) = self.next_job().await {
            match self.executor.execute(&item).await {
                Ok(outcome) => {
                    stats.record_success(&outcome);
                    if self.results_tx.send(outcome).await.is_err() {
                        tracing::warn!(
                            worker_id = self.id,
                            "Result channel closed, worker stopping"
                        );
                        break;
                    }
                }
                Err(e) => {
                    stats.record_failure(&e);
                    tracing::debug!(
                        worker_id = self.id,
                        job_id = item.id(),
                        error = %e,
                        "Request failed"
                    );
                }
            }
        }

        stats.stop();
        tracing::debug!(
            worker_id = self.id,
            completed = stats.completed,
            errors = stats.errors,
            timeouts = stats.timeouts,
            elapsed_ms = ?stats.elapsed().map(|d| d.as_millis()),
            "Worker finished"
        );

        stats
    }

    /// Next item, or `None` once the channel is closed and empty
    ///
    /// The lock is held across the wait so exactly one idle worker is parked
    /// on the channel at a time; the others queue on the mutex.
    async fn next_job(&self) -> Option<WorkItem> {
        self.jobs.lock().await.recv().await
    }

    /// Get the worker ID
    pub fn id(&self) -> usize {
        self.id
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker").field("id", &self.id).finish()
    }
}
