//! Common test utilities shared across integration tests.

use roster::{Pool, PoolStatus};
use std::time::Duration;

/// Initialize tracing once so scheduling failures are debuggable via RUST_LOG.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Wait for the pool to reach an expected status, polling.
///
/// This is more reliable than fixed sleeps since pause timing can vary.
/// Polls every 10ms and times out after the specified duration.
///
/// # Panics
///
/// Panics if the timeout is reached before the pool reaches the expected
/// status.
pub async fn wait_for_pool_status(pool: &Pool, expected: PoolStatus, timeout: Duration) {
    let start = tokio::time::Instant::now();
    loop {
        if pool.status() == expected {
            return;
        }
        if start.elapsed() > timeout {
            panic!(
                "Timeout waiting for pool to reach {:?}, current status: {:?}",
                expected,
                pool.status()
            );
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
