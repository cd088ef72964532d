//! Channel configuration for the job and result pipelines

use crate::config::ConfigError;

/// Channel buffer configuration
///
/// `job_buffer` bounds the Job Source -> worker channel; the producer
/// suspends when it is full. `result_buffer` bounds the worker -> Result Sink
/// channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Job channel capacity
    pub job_buffer: usize,

    /// Result channel capacity
    pub result_buffer: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            job_buffer: 10_000,
            result_buffer: 10_000,
        }
    }
}

impl ChannelConfig {
    /// Size both channels to hold a full burst of `jobs` without blocking
    pub fn sized_for(jobs: usize) -> Self {
        let size = jobs.max(1);
        Self {
            job_buffer: size,
            result_buffer: size,
        }
    }

    /// Set the job channel capacity
    pub fn with_job_buffer(mut self, size: usize) -> Self {
        self.job_buffer = size;
        self
    }

    /// Set the result channel capacity
    pub fn with_result_buffer(mut self, size: usize) -> Self {
        self.result_buffer = size;
        self
    }

    /// Bounded tokio channels need a capacity of at least one
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.job_buffer == 0 {
            return Err(ConfigError::InvalidBuffer(
                "job buffer must be at least 1".into(),
            ));
        }
        if self.result_buffer == 0 {
            return Err(ConfigError::InvalidBuffer(
                "result buffer must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
