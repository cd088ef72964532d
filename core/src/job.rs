//! Work items and the job source that produces them

use std::sync::Arc;

use reqwest::Url;
use tokio::sync::mpsc;

/// One unit of dispatchable work: an ordinal and the URL to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    id: usize,
    target: Arc<Url>,
}

impl WorkItem {
    /// Create a work item
    pub fn new(id: usize, target: Arc<Url>) -> Self {
        Self { id, target }
    }

    /// Ordinal within the batch (0..jobs)
    pub fn id(&self) -> usize {
        self.id
    }

    /// URL to request
    pub fn target(&self) -> &Url {
        &self.target
    }
}

/// Single producer of the work item stream
#[derive(Debug, Clone)]
pub struct JobSource {
    jobs: usize,
    target: Arc<Url>,
}

impl JobSource {
    /// Create a source for `jobs` items against `target`
    pub fn new(jobs: usize, target: Arc<Url>) -> Self {
        Self { jobs, target }
    }

    /// Number of items this source will produce
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Push every item into `tx`, then close the stream by dropping it
    ///
    /// Suspends while the channel is full. Returns the number of items
    /// enqueued, which is `jobs` unless every receiver went away first.
    pub async fn run(self, tx: mpsc::Sender<WorkItem>) -> usize {
        let mut enqueued = 0;
        for id in 0..self.jobs {
            let item = WorkItem::new(id, Arc::clone(&self.target));
            if tx.send(item).await.is_err() {
                tracing::warn!(
                    enqueued,
                    requested = self.jobs,
                    "Job channel closed by consumers, stopping early"
                );
                return enqueued;
            }
            enqueued += 1;
        }
        tracing::debug!(enqueued, "Job source exhausted");
        enqueued
    }
}
