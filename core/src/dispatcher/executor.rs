//! Dispatcher execution logic

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use tokio::sync::{mpsc, oneshot};

use crate::channel::ChannelConfig;
use crate::clock::Clock;
use crate::config::{DispatchConfig, PoolStrategy};
use crate::elastic::{ElasticPool, PoolSnapshot};
use crate::error::{GabError, GabResult};
use crate::job::JobSource;
use crate::request::DialStats;
use crate::traits::RequestExecutor;
use crate::worker::FixedPool;

use super::aggregator::{aggregate_worker_stats, gather_results, throughput, RunSummary};

/// Lifecycle of a dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Built, `run` not called yet
    NotStarted,
    /// Pipeline in progress
    Running,
    /// Every item processed and every result counted
    Drained,
}

/// Dispatcher owns one batch run
///
/// Wires the job source, a worker pool and the result sink together,
/// waits for the pipeline to drain, and keeps the completed count and
/// elapsed time for throughput reporting.
pub struct Dispatcher {
    /// Dispatch configuration
    pub(crate) config: DispatchConfig,

    /// Parsed target shared by every work item
    pub(crate) target: Arc<Url>,

    /// Channel capacities
    pub(crate) channels: ChannelConfig,

    /// Request executor (shared across workers)
    pub(crate) executor: Arc<dyn RequestExecutor>,

    /// Reference clock for elapsed time
    pub(crate) clock: Arc<dyn Clock>,

    /// DNS counters when the built-in HTTP executor is used
    pub(crate) dial_stats: Option<Arc<DialStats>>,

    phase: Phase,
    completed: u64,
    elapsed: Option<Duration>,
    pool: Option<PoolSnapshot>,
}

impl Dispatcher {
    /// Create a new dispatcher
    ///
    /// Use `DispatcherBuilder` for validated construction.
    pub fn new(
        config: DispatchConfig,
        target: Arc<Url>,
        channels: ChannelConfig,
        executor: Arc<dyn RequestExecutor>,
        clock: Arc<dyn Clock>,
        dial_stats: Option<Arc<DialStats>>,
    ) -> Self {
        Self {
            config,
            target,
            channels,
            executor,
            clock,
            dial_stats,
            phase: Phase::NotStarted,
            completed: 0,
            elapsed: None,
            pool: None,
        }
    }

    /// Get the dispatch configuration
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Run the batch to completion
    ///
    /// Returns once every work item has been processed and every outcome
    /// counted. A dispatcher runs at most once.
    pub async fn run(&mut self) -> GabResult<()> {
        if self.phase != Phase::NotStarted {
            return Err(GabError::AlreadyRun);
        }
        self.phase = Phase::Running;

        tracing::info!(
            workers = self.config.workers,
            jobs = self.config.jobs,
            strategy = %self.config.strategy,
            target = %self.target,
            "Starting dispatch"
        );

        let started = self.clock.now();

        let (jobs_tx, jobs_rx) = mpsc::channel(self.channels.job_buffer);
        let (results_tx, results_rx) = mpsc::channel(self.channels.result_buffer);
        let (done_tx, done_rx) = oneshot::channel();

        let source = tokio::spawn(
            JobSource::new(self.config.jobs, Arc::clone(&self.target)).run(jobs_tx),
        );
        let sink = tokio::spawn(gather_results(results_rx, done_tx));

        let executor = Arc::clone(&self.executor);
        match self.config.strategy {
            PoolStrategy::Fixed => {
                let stats = FixedPool::new(self.config.workers)
                    .drain(executor, jobs_rx, results_tx)
                    .await?;
                let totals = aggregate_worker_stats(&stats);
                tracing::debug!(
                    workers = totals.workers,
                    completed = totals.completed,
                    errors = totals.errors,
                    timeouts = totals.timeouts,
                    "Fixed pool drained"
                );
            }
            PoolStrategy::Elastic => {
                let pool = ElasticPool::new(self.config.workers, self.config.idle_timeout);
                self.pool = Some(pool.drain(executor, jobs_rx, results_tx).await?);
            }
            PoolStrategy::Sequential => {
                let stats = FixedPool::drain_inline(executor, jobs_rx, results_tx).await?;
                tracing::debug!(
                    completed = stats.completed,
                    errors = stats.errors,
                    "Sequential run drained"
                );
            }
        }

        let completed = done_rx
            .await
            .map_err(|_| GabError::dispatch("result sink stopped without reporting a count"))?;
        let elapsed = self.clock.since(started);

        let enqueued = source
            .await
            .map_err(|e| GabError::dispatch(format!("job source failed: {e}")))?;
        sink.await
            .map_err(|e| GabError::dispatch(format!("result sink failed: {e}")))?;

        self.completed = completed;
        self.elapsed = Some(elapsed);
        self.phase = Phase::Drained;

        tracing::info!(
            enqueued,
            completed,
            elapsed_secs = elapsed.as_secs_f64(),
            qps = self.qps(),
            "Dispatch complete"
        );

        Ok(())
    }

    /// Requests per second; `0.0` until the run has drained
    pub fn qps(&self) -> f64 {
        match (self.phase, self.elapsed) {
            (Phase::Drained, Some(elapsed)) => throughput(self.completed, elapsed),
            _ => 0.0,
        }
    }

    /// Successful responses counted by the result sink
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Time from start to full drain, once drained
    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Elastic pool counters after an elastic run
    pub fn gauge(&self) -> Option<PoolSnapshot> {
        self.pool
    }

    /// DNS counters of the built-in HTTP executor
    pub fn dial_stats(&self) -> Option<Arc<DialStats>> {
        self.dial_stats.clone()
    }

    /// Final figures, once drained
    pub fn summary(&self) -> Option<RunSummary> {
        let elapsed = self.elapsed?;
        Some(RunSummary {
            strategy: self.config.strategy,
            workers: self.config.workers,
            jobs: self.config.jobs,
            completed: self.completed,
            elapsed,
            qps: self.qps(),
            pool: self.pool,
        })
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .field("phase", &self.phase)
            .field("completed", &self.completed)
            .field("elapsed", &self.elapsed)
            .finish()
    }
}
