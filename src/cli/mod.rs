//! CLI argument parsing and validation

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use gab_core::{DispatchConfig, PoolStrategy, Url};

#[derive(Parser, Debug)]
#[command(name = "gab")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Runtime worker threads
    #[arg(long, default_value_t = num_cpus::get())]
    pub cpus: usize,

    /// Total number of requests
    #[arg(short = 'n', long = "requests", default_value_t = 20)]
    pub requests: usize,

    /// Number of concurrent workers
    #[arg(short = 'c', long, default_value_t = 5)]
    pub concurrency: usize,

    /// Dispatch strategy: fixed, elastic or sequential
    #[arg(long, default_value = "fixed")]
    pub pool: PoolStrategy,

    /// Idle time before an elastic worker exits, in milliseconds
    #[arg(long = "idle-timeout-ms", default_value_t = 1)]
    pub idle_timeout_ms: u64,

    /// Per-request timeout, in seconds
    #[arg(long = "timeout-secs", default_value_t = 20)]
    pub timeout_secs: u64,

    /// Also run a single-worker baseline after the main run
    #[arg(long)]
    pub baseline: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Target URL (http only)
    pub url: String,
}

impl Cli {
    /// Check the flags and return the parsed target
    pub fn validate(&self) -> Result<Url> {
        if self.requests < 1 {
            bail!("number of requests must be at least 1");
        }
        if self.concurrency < 1 {
            bail!("concurrency must be at least 1");
        }
        if self.requests < self.concurrency {
            bail!(
                "number of requests ({}) must not be less than concurrency ({})",
                self.requests,
                self.concurrency
            );
        }
        if self.cpus < 1 {
            bail!("cpus must be at least 1");
        }
        if self.idle_timeout_ms < 1 {
            bail!("idle timeout must be at least 1ms");
        }
        if self.timeout_secs < 1 {
            bail!("request timeout must be at least 1s");
        }

        let url = Url::parse(&self.url).with_context(|| format!("invalid URL '{}'", self.url))?;
        if url.scheme() != "http" {
            bail!("only http is supported, got '{}'", url.scheme());
        }

        Ok(url)
    }

    /// Dispatch configuration for a run with the given strategy
    pub fn dispatch_config(&self, strategy: PoolStrategy) -> DispatchConfig {
        DispatchConfig::new(self.concurrency, self.requests, self.url.clone())
            .with_strategy(strategy)
            .with_idle_timeout(Duration::from_millis(self.idle_timeout_ms))
            .with_request_timeout(Duration::from_secs(self.timeout_secs))
    }

    /// First output line, echoing the effective settings
    pub fn header(&self) -> String {
        format!(
            "cpus={},n={},c={},url={}",
            self.cpus, self.requests, self.concurrency, self.url
        )
    }
}
