//! Self-expiring worker

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;

use crate::job::WorkItem;
use crate::response::Outcome;
use crate::traits::RequestExecutor;
use crate::worker::WorkerStats;

use super::gauge::Lease;

/// Sender half of a worker's private inbox, as parked in the idle channel
pub(super) type Handoff = mpsc::Sender<WorkItem>;

/// Worker that advertises itself when idle and retires after `idle_timeout`
pub(super) struct ElasticWorker {
    pub(super) id: usize,
    pub(super) first: WorkItem,
    pub(super) executor: Arc<dyn RequestExecutor>,
    pub(super) inbox: mpsc::Receiver<WorkItem>,
    pub(super) handoff: Handoff,
    pub(super) idle_tx: mpsc::Sender<Handoff>,
    pub(super) results_tx: mpsc::Sender<Outcome>,
    pub(super) idle_timeout: Duration,
    pub(super) shutdown: broadcast::Receiver<()>,
    pub(super) lease: Lease,
}

impl ElasticWorker {
    pub(super) async fn run(mut self) -> WorkerStats {
        let mut stats = WorkerStats::new();
        stats.start();

        let first = self.first.clone();
        let mut open = self.process(first, &mut stats).await;

        while open {
            // registration fails once the dispatch loop has stopped listening
            if self.idle_tx.try_send(self.handoff.clone()).is_err() {
                break;
            }

            let next = tokio::select! {
                biased;
                received = timeout(self.idle_timeout, self.inbox.recv()) => received.ok().flatten(),
                _ = self.shutdown.recv() => None,
            };

            match next {
                Some(item) => open = self.process(item, &mut stats).await,
                None => break,
            }
        }

        // anything handed over between the timeout and close still runs
        self.inbox.close();
        while let Ok(item) = self.inbox.try_recv() {
            if open {
                open = self.process(item, &mut stats).await;
            }
        }

        stats.stop();
        tracing::trace!(
            worker_id = self.id,
            completed = stats.completed,
            errors = stats.errors,
            "Elastic worker expired"
        );
        drop(self.lease);

        stats
    }

    /// Execute one item; `false` once the result channel is gone
    async fn process(&self, item: WorkItem, stats: &mut WorkerStats) -> bool {
        match self.executor.execute(&item).await {
            Ok(outcome) => {
                stats.record_success(&outcome);
                if self.results_tx.send(outcome).await.is_err() {
                    tracing::warn!(worker_id = self.id, "Result channel closed, worker stopping");
                    return false;
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
        true
    }
}
