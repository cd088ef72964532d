//! Builder pattern for Dispatcher construction

use std::sync::Arc;
use std::time::Duration;

use crate::channel::ChannelConfig;
use crate::clock::{Clock, MonotonicClock};
use crate::config::{DispatchConfig, PoolStrategy};
use crate::error::GabResult;
use crate::request::HttpExecutor;
use crate::traits::RequestExecutor;

use super::executor::Dispatcher;

/// Builder for creating a Dispatcher with validated configuration
///
/// # Example
///
/// ```ignore
/// let mut dispatcher = DispatcherBuilder::new()
///     .workers(5)
///     .jobs(20)
///     .target("http://localhost:8080/")
///     .strategy(PoolStrategy::Elastic)
///     .build()?;
///
/// dispatcher.run().await?;
/// println!("QPS={:.1}", dispatcher.qps());
/// ```
pub struct DispatcherBuilder {
    config: DispatchConfig,
    channel_config: Option<ChannelConfig>,
    executor: Option<Arc<dyn RequestExecutor>>,
    clock: Option<Arc<dyn Clock>>,
}

impl DispatcherBuilder {
    /// Create a new dispatcher builder with default configuration
    pub fn new() -> Self {
        Self {
            config: DispatchConfig::default(),
            channel_config: None,
            executor: None,
            clock: None,
        }
    }

    /// Set the full dispatch configuration
    pub fn config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the worker count
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Set the number of requests
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.config.jobs = jobs;
        self
    }

    /// Set the target URL
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.config.target = target.into();
        self
    }

    /// Set the pool strategy
    pub fn strategy(mut self, strategy: PoolStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// Set the elastic idle timeout
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Set the per-request timeout of the default HTTP executor
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the channel configuration
    ///
    /// Defaults to channels sized for the job count.
    pub fn channel_config(mut self, config: ChannelConfig) -> Self {
        self.channel_config = Some(config);
        self
    }

    /// Use a custom request executor instead of the HTTP client
    pub fn executor(mut self, executor: Arc<dyn RequestExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Use a custom reference clock
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the dispatcher
    ///
    /// # Errors
    ///
    /// Returns an error if configuration validation fails or the HTTP client
    /// cannot be constructed.
    pub fn build(self) -> GabResult<Dispatcher> {
        self.config.validate()?;
        let target = Arc::new(self.config.target_url()?);

        let channels = self
            .channel_config
            .unwrap_or_else(|| ChannelConfig::sized_for(self.config.jobs));
        channels.validate()?;

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()) as Arc<dyn Clock>);

        let (executor, dial_stats) = match self.executor {
            Some(executor) => (executor, None),
            None => {
                let http = HttpExecutor::new(self.config.request_timeout, Arc::clone(&clock))?;
                let dial_stats = http.dial_stats();
                (Arc::new(http) as Arc<dyn RequestExecutor>, Some(dial_stats))
            }
        };

        Ok(Dispatcher::new(
            self.config,
            target,
            channels,
            executor,
            clock,
            dial_stats,
        ))
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
