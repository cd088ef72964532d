//! Fixed-size worker pool

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{mpsc, Mutex};

use crate::error::{GabError, GabResult};
use crate::job::WorkItem;
use crate::response::Outcome;
use crate::traits::RequestExecutor;

use super::builder::WorkerBuilder;
use super::executor::SharedJobs;
use super::stats::WorkerStats;

/// A static set of workers draining one shared job channel
#[derive(Debug, Clone, Copy)]
pub struct FixedPool {
    workers: usize,
}

impl FixedPool {
    /// Create a pool of `workers` workers
    pub fn new(workers: usize) -> Self {
        Self { workers }
    }

    /// Number of workers this pool spawns
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Spawn the workers and wait for all of them to finish
    ///
    /// Consumes `results_tx`; once this returns every result sender is gone
    /// and the result channel is closed.
    pub async fn drain(
        &self,
        executor: Arc<dyn RequestExecutor>,
        jobs_rx: mpsc::Receiver<WorkItem>,
        results_tx: mpsc::Sender<Outcome>,
    ) -> GabResult<Vec<WorkerStats>> {
        let jobs: SharedJobs = Arc::new(Mutex::new(jobs_rx));
        let mut handles = Vec::with_capacity(self.workers);

        for worker_id in 0..self.workers {
            let worker = WorkerBuilder::new(worker_id)
                .executor(Arc::clone(&executor))
                .jobs(Arc::clone(&jobs))
                .results_tx(results_tx.clone())
                .build()?;

            handles.push(tokio::spawn(worker.run()));
        }
        drop(results_tx);

        tracing::debug!(workers = self.workers, "Fixed pool running");

        let mut results = Vec::with_capacity(handles.len());
        let mut worker_failures = 0;
        for (idx, joined) in join_all(handles).await.into_iter().enumerate() {
            match joined {
                Ok(stats) => results.push(stats),
                Err(e) => {
                    worker_failures += 1;
                    tracing::error!(worker_id = idx, error = %e, "Worker task panicked");
                }
            }
        }

        if worker_failures > 0 {
            return Err(GabError::worker(format!(
                "{} of {} workers failed to complete",
                worker_failures, self.workers
            )));
        }

        Ok(results)
    }

    /// Drain the job channel with a single worker in the caller's task
    pub async fn drain_inline(
        executor: Arc<dyn RequestExecutor>,
        jobs_rx: mpsc::Receiver<WorkItem>,
        results_tx: mpsc::Sender<Outcome>,
    ) -> GabResult<WorkerStats> {
        let worker = WorkerBuilder::new(0)
            .executor(executor)
            .jobs(Arc::new(Mutex::new(jobs_rx)))
            .results_tx(results_tx)
            .build()?;

        Ok(worker.run().await)
    }
}
