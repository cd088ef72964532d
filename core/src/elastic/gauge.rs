//! Live/peak/spawned counters for the elastic pool

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Notify;

/// Point-in-time reading of a [`PoolGauge`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolSnapshot {
    /// Workers currently alive (idle or busy)
    pub live: usize,

    /// Highest number of simultaneously live workers
    pub peak: usize,

    /// Workers spawned over the pool's lifetime
    pub spawned: usize,
}

impl fmt::Display for PoolSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "live={} peak={} spawned={}",
            self.live, self.peak, self.spawned
        )
    }
}

/// Shared counters describing the elastic pool's population
///
/// Only the dispatch loop admits workers, through [`PoolGauge::try_lease`];
/// a worker leaves by dropping its [`Lease`].
#[derive(Debug, Default)]
pub struct PoolGauge {
    live: AtomicUsize,
    peak: AtomicUsize,
    spawned: AtomicUsize,
    exited: Notify,
}

impl PoolGauge {
    /// Create an empty gauge
    pub fn new() -> Self {
        Self::default()
    }

    /// Workers currently alive
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously live workers so far
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Total workers spawned so far
    pub fn spawned(&self) -> usize {
        self.spawned.load(Ordering::SeqCst)
    }

    /// Read all counters
    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            live: self.live(),
            peak: self.peak(),
            spawned: self.spawned(),
        }
    }

    /// Admit one more worker unless `cap` are already live
    pub(crate) fn try_lease(self: &Arc<Self>, cap: usize) -> Option<Lease> {
        let previous = self
            .live
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |live| {
                (live < cap).then_some(live + 1)
            })
            .ok()?;

        self.peak.fetch_max(previous + 1, Ordering::SeqCst);
        self.spawned.fetch_add(1, Ordering::SeqCst);

        Some(Lease {
            gauge: Arc::clone(self),
        })
    }

    /// Resolves after some worker has exited
    ///
    /// An exit that happens while nobody waits is remembered, so a caller
    /// that checked `live` before waiting cannot miss it.
    pub(crate) async fn worker_exited(&self) {
        self.exited.notified().await
    }
}

/// One live worker's slot in the gauge; released on drop
#[derive(Debug)]
pub(crate) struct Lease {
    gauge: Arc<PoolGauge>,
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.gauge.live.fetch_sub(1, Ordering::SeqCst);
        self.gauge.exited.notify_one();
    }
}
