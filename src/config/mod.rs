//! Pool configuration.
//!
//! Timing knobs for the supervisor and the execution loops. Defaults suit a
//! long-running agent; tests shrink them to keep scenarios fast.

use std::time::Duration;

/// Default pause window before the pool retries after a failure.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(30);

/// Default interval at which an initializing execution polls `Job::ready`.
pub const DEFAULT_READY_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Configuration for a [`Pool`](crate::pool::Pool).
#[derive(Debug, Clone)]
pub struct PoolConfig {
    retry_interval: Duration,
    ready_poll_interval: Duration,
}

impl PoolConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self {
            retry_interval: DEFAULT_RETRY_INTERVAL,
            ready_poll_interval: DEFAULT_READY_POLL_INTERVAL,
        }
    }

    /// Set how long the pool stays `Stopped` before resuming executions.
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Set how often an initializing execution polls its job's readiness.
    pub fn with_ready_poll_interval(mut self, interval: Duration) -> Self {
        self.ready_poll_interval = interval;
        self
    }

    /// The pause window before the pool retries after a failure.
    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    /// The readiness polling interval.
    pub fn ready_poll_interval(&self) -> Duration {
        self.ready_poll_interval
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new()
    }
}
