//! Elastic worker pool
//!
//! Workers are created on demand and retire when they sit idle:
//!
//! - An idle worker parks the sender half of its private inbox in the
//!   availability channel.
//! - For every item the dispatch loop takes a parked inbox and hands the item
//!   over. If no worker is idle and fewer than `max_workers` are live it spawns
//!   a new worker carrying the item. Otherwise it waits until a worker parks
//!   itself or exits.
//! - A worker that receives nothing within `idle_timeout` closes its inbox,
//!   finishes anything that slipped in, and exits. An inbox closed this way
//!   bounces the item back to the dispatch loop, which tries again.
//!
//! [`PoolGauge`] counts live, peak and spawned workers.
//!
//! # Example
//!
//! ```ignore
//! use gab_core::elastic::ElasticPool;
//!
//! let pool = ElasticPool::new(5, Duration::from_millis(1));
//! let snapshot = pool.drain(executor, jobs_rx, results_tx).await?;
//! assert!(snapshot.peak <= 5);
//! ```

mod gauge;
mod pool;
mod worker;

pub use gauge::{PoolGauge, PoolSnapshot};
pub use pool::ElasticPool;
