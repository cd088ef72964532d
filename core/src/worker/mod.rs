//! Fixed worker pool
//!
//! The fixed pool is the default dispatch strategy: a static set of worker
//! tasks that all pull from one job channel. Each Worker is a tokio task that:
//!
//! 1. Takes the next work item from the shared job channel
//! 2. Executes it via a RequestExecutor
//! 3. Sends the Outcome to the result sink on success
//! 4. Repeats until the channel is closed and empty
//!
//! Failed requests are logged and dropped; they never reach the result sink.
//!
//! # Example
//!
//! ```ignore
//! use gab_core::worker::FixedPool;
//!
//! let stats = FixedPool::new(5)
//!     .drain(executor, jobs_rx, results_tx)
//!     .await?;
//! println!("Workers finished: {}", stats.len());
//! ```

mod builder;
mod executor;
mod pool;
mod stats;

pub use builder::WorkerBuilder;
pub use executor::{SharedJobs, Worker};
pub use pool::FixedPool;
pub use stats::WorkerStats;
