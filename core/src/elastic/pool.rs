//! Elastic pool dispatch loop

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinSet;

use crate::config::DEFAULT_IDLE_TIMEOUT;
use crate::error::{GabError, GabResult};
use crate::job::WorkItem;
use crate::response::Outcome;
use crate::traits::RequestExecutor;
use crate::worker::WorkerStats;

use super::gauge::{Lease, PoolGauge, PoolSnapshot};
use super::worker::{ElasticWorker, Handoff};

/// Worker pool that grows on demand up to a cap and shrinks when idle
#[derive(Debug, Clone)]
pub struct ElasticPool {
    max_workers: usize,
    idle_timeout: Duration,
    gauge: Arc<PoolGauge>,
}

impl ElasticPool {
    /// Create a pool allowing at most `max_workers` live workers
    ///
    /// A cap of zero is raised to one.
    pub fn new(max_workers: usize, idle_timeout: Duration) -> Self {
        Self {
            max_workers: max_workers.max(1),
            idle_timeout,
            gauge: Arc::new(PoolGauge::new()),
        }
    }

    /// Upper bound on live workers
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// How long a worker waits for an item before expiring
    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Population counters, shared with the running pool
    pub fn gauge(&self) -> Arc<PoolGauge> {
        Arc::clone(&self.gauge)
    }

    /// Hand every item from `jobs_rx` to a worker and wait for all workers
    ///
    /// Consumes `results_tx`; once this returns every result sender is gone
    /// and the result channel is closed.
    pub async fn drain(
        &self,
        executor: Arc<dyn RequestExecutor>,
        mut jobs_rx: mpsc::Receiver<WorkItem>,
        results_tx: mpsc::Sender<Outcome>,
    ) -> GabResult<PoolSnapshot> {
        let (idle_tx, idle_rx) = mpsc::channel(self.max_workers);
        let (shutdown_tx, _) = broadcast::channel(1);

        let mut dispatch = DispatchLoop {
            pool: self,
            executor,
            results_tx,
            idle_tx,
            idle_rx,
            shutdown_tx,
            workers: JoinSet::new(),
            next_id: 0,
        };

        tracing::debug!(
            max_workers = self.max_workers,
            idle_timeout_us = self.idle_timeout.as_micros() as u64,
            "Elastic pool running"
        );

        while let Some(item) = jobs_rx.recv().await {
            dispatch.place(item).await;
        }

        dispatch.finish().await?;

        let snapshot = self.gauge.snapshot();
        tracing::debug!(%snapshot, "Elastic pool drained");
        Ok(snapshot)
    }
}

impl Default for ElasticPool {
    fn default() -> Self {
        Self::new(1, DEFAULT_IDLE_TIMEOUT)
    }
}

/// State owned by one `drain` call
struct DispatchLoop<'a> {
    pool: &'a ElasticPool,
    executor: Arc<dyn RequestExecutor>,
    results_tx: mpsc::Sender<Outcome>,
    idle_tx: mpsc::Sender<Handoff>,
    idle_rx: mpsc::Receiver<Handoff>,
    shutdown_tx: broadcast::Sender<()>,
    workers: JoinSet<WorkerStats>,
    next_id: usize,
}

impl DispatchLoop<'_> {
    /// Deliver one item: to an idle worker, else a new worker, else wait
    async fn place(&mut self, item: WorkItem) {
        let mut pending = item;

        loop {
            if let Ok(handoff) = self.idle_rx.try_recv() {
                match handoff.try_send(pending) {
                    Ok(()) => return,
                    // that worker expired after registering
                    Err(e) => {
                        pending = e.into_inner();
                        continue;
                    }
                }
            }

            if let Some(lease) = self.pool.gauge.try_lease(self.pool.max_workers) {
                self.spawn(pending, lease);
                return;
            }

            tokio::select! {
                Some(handoff) = self.idle_rx.recv() => {
                    match handoff.try_send(pending) {
                        Ok(()) => return,
                        Err(e) => pending = e.into_inner(),
                    }
                }
                _ = self.pool.gauge.worker_exited() => {}
            }
        }
    }

    fn spawn(&mut self, first: WorkItem, lease: Lease) {
        let (handoff, inbox) = mpsc::channel(1);
        let worker = ElasticWorker {
            id: self.next_id,
            first,
            executor: Arc::clone(&self.executor),
            inbox,
            handoff,
            idle_tx: self.idle_tx.clone(),
            results_tx: self.results_tx.clone(),
            idle_timeout: self.pool.idle_timeout,
            shutdown: self.shutdown_tx.subscribe(),
            lease,
        };
        self.next_id += 1;

        tracing::trace!(worker_id = worker.id, "Spawning elastic worker");
        self.workers.spawn(worker.run());
    }

    /// Stop accepting registrations, release idle workers and join them all
    async fn finish(self) -> GabResult<()> {
        let DispatchLoop {
            results_tx,
            idle_tx,
            idle_rx,
            shutdown_tx,
            mut workers,
            next_id,
            ..
        } = self;

        drop(idle_rx);
        drop(idle_tx);
        drop(results_tx);
        let _ = shutdown_tx.send(());

        let mut completed = 0;
        let mut errors = 0;
        let mut worker_failures = 0;
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(stats) => {
                    completed += stats.completed;
                    errors += stats.errors;
                }
                Err(e) => {
                    worker_failures += 1;
                    tracing::error!(error = %e, "Elastic worker panicked");
                }
            }
        }

        tracing::debug!(workers = next_id, completed, errors, "Elastic workers joined");

        if worker_failures > 0 {
            return Err(GabError::worker(format!(
                "{} of {} elastic workers failed to complete",
                worker_failures, next_id
            )));
        }

        Ok(())
    }
}
