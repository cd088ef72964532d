//! gab-core: Dispatch engine for the gab HTTP load generator
//!
//! This crate drives a batch of GET requests against one target and reports
//! throughput. It provides:
//!
//! - The job source and work item stream
//! - A fixed worker pool and an elastic, self-expiring pool
//! - The result sink and the dispatcher that ties them together
//! - A reqwest-backed request executor with DNS timing
//! - Configuration, clocks and error handling

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod elastic;
pub mod error;
pub mod job;
pub mod request;
pub mod response;
pub mod traits;
pub mod worker;

#[cfg(test)]
mod testing;

pub use channel::ChannelConfig;
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{ConfigError, DispatchConfig, PoolStrategy};
pub use dispatcher::{Dispatcher, DispatcherBuilder, Phase, RunSummary};
pub use elastic::{ElasticPool, PoolGauge, PoolSnapshot};
pub use error::*;
pub use job::{JobSource, WorkItem};
pub use request::{DialStats, HttpExecutor, TimingResolver};
pub use response::*;
pub use traits::*;
pub use worker::{FixedPool, Worker, WorkerBuilder, WorkerStats};

pub use reqwest::Url;
