//! Dispatcher for batch run lifecycle management
//!
//! The Dispatcher coordinates one complete run:
//! - Starting the job source that enqueues every work item
//! - Starting the result sink that counts successful outcomes
//! - Draining the job stream through the configured pool strategy
//! - Recording elapsed time and computing throughput
//!
//! # Example
//!
//! ```ignore
//! use gab_core::{DispatcherBuilder, PoolStrategy};
//!
//! let mut dispatcher = DispatcherBuilder::new()
//!     .workers(5)
//!     .jobs(20)
//!     .target("http://localhost:8080/")
//!     .strategy(PoolStrategy::Fixed)
//!     .build()?;
//!
//! dispatcher.run().await?;
//! println!("QPS={:.1}", dispatcher.qps());
//! ```

mod aggregator;
mod builder;
mod executor;

pub use aggregator::{aggregate_worker_stats, gather_results, throughput, RunSummary, WorkerTotals};
pub use builder::DispatcherBuilder;
pub use executor::{Dispatcher, Phase};
