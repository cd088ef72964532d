//! Per-request results

use std::time::Duration;

/// Marker for one successful request
///
/// Only produced on success. The latency rides along for callers that want
/// it; the result sink only counts outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// Ordinal of the work item that succeeded
    pub job_id: usize,

    /// Time from sending the request to draining the body
    pub latency: Duration,
}

impl Outcome {
    /// Create an outcome for `job_id`
    pub fn new(job_id: usize, latency: Duration) -> Self {
        Self { job_id, latency }
    }
}

/// Timings captured while executing one request
///
/// All offsets are readings of the dispatcher's reference clock, so traces
/// from different workers line up on one timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestTrace {
    /// Clock reading when the request was issued
    pub started_at: Duration,

    /// Time until response headers arrived
    pub first_byte: Duration,

    /// Time until the body was fully drained
    pub total: Duration,

    /// Body size in bytes
    pub body_bytes: usize,
}

impl RequestTrace {
    /// Time spent reading the body after the headers arrived
    pub fn transfer(&self) -> Duration {
        self.total.saturating_sub(self.first_byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_transfer() {
        let trace = RequestTrace {
            started_at: Duration::from_millis(100),
            first_byte: Duration::from_millis(30),
            total: Duration::from_millis(45),
            body_bytes: 10,
        };
        assert_eq!(trace.transfer(), Duration::from_millis(15));
    }

    #[test]
    fn test_trace_transfer_saturates() {
        let trace = RequestTrace {
            first_byte: Duration::from_millis(30),
            ..Default::default()
        };
        assert_eq!(trace.transfer(), Duration::ZERO);
    }
}
