//! Detached executions and the circuit breaker.
//!
//! Detached jobs exist to escape pool-wide coupling: they keep executing,
//! and keep reading the pool's status, while the pool itself is stopped.

use roster::testing::{CountingJob, FailingJob};
use roster::{Pool, PoolConfig, PoolStatus};
use std::sync::Arc;
use std::time::Duration;

use crate::common;

fn paused_pool_config() -> PoolConfig {
    PoolConfig::new()
        .with_retry_interval(Duration::from_millis(600))
        .with_ready_poll_interval(Duration::from_millis(10))
}

#[tokio::test]
async fn test_detached_job_keeps_running_while_pool_is_stopped() {
    common::init_tracing();

    let pool = Pool::with_config(paused_pool_config());

    let detached = CountingJob::new();
    pool.register_detached_interval_job(detached.clone(), Duration::from_millis(10))
        .await
        .unwrap();

    // A job failing on its first call trips the breaker almost immediately.
    pool.register_interval_job(FailingJob::fail_every(1), Duration::from_millis(10))
        .await
        .unwrap();

    common::wait_for_pool_status(&pool, PoolStatus::Stopped, Duration::from_secs(1)).await;

    // The detached job accumulates executions inside the pause window.
    let before = detached.executions();
    let mut grew_while_stopped = false;
    for _ in 0..40 {
        if pool.status() != PoolStatus::Stopped {
            break;
        }
        if detached.executions() > before {
            grew_while_stopped = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert!(
        grew_while_stopped,
        "the detached job stopped executing during the pool pause"
    );
    pool.shutdown().await;
}

#[tokio::test]
async fn test_detached_failure_does_not_trip_the_breaker() {
    common::init_tracing();

    let pool = Pool::with_config(paused_pool_config());

    // Fails on every call, but is detached: the pool must stay running.
    let failing_detached = FailingJob::fail_every(1);
    pool.register_detached_interval_job(failing_detached.clone(), Duration::from_millis(10))
        .await
        .unwrap();

    let healthy = CountingJob::new();
    pool.register_interval_job(healthy.clone(), Duration::from_millis(10))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(pool.status(), PoolStatus::Running);
    assert!(failing_detached.was_failed());
    assert!(
        healthy.executions() >= 2,
        "a detached failure disturbed a non-detached job"
    );
    pool.shutdown().await;
}

#[tokio::test]
async fn test_detached_job_reads_pool_status_during_pause() {
    common::init_tracing();

    let pool = Pool::with_config(paused_pool_config());

    // A detached observer that samples the pool's status on every tick,
    // the way a status reporter does.
    struct StatusSampler {
        pool: Pool,
        saw_stopped: std::sync::atomic::AtomicBool,
    }

    #[async_trait::async_trait]
    impl roster::Job for StatusSampler {
        fn ready(&self) -> bool {
            true
        }

        fn status(&self) -> Result<(), roster::JobError> {
            Ok(())
        }

        async fn execute(&self) -> Result<(), roster::JobError> {
            if self.pool.status() == PoolStatus::Stopped {
                self.saw_stopped
                    .store(true, std::sync::atomic::Ordering::SeqCst);
            }
            Ok(())
        }
    }

    let sampler = Arc::new(StatusSampler {
        pool: pool.clone(),
        saw_stopped: std::sync::atomic::AtomicBool::new(false),
    });
    pool.register_detached_interval_job(sampler.clone(), Duration::from_millis(10))
        .await
        .unwrap();

    pool.register_interval_job(FailingJob::fail_every(1), Duration::from_millis(10))
        .await
        .unwrap();

    common::wait_for_pool_status(&pool, PoolStatus::Stopped, Duration::from_secs(1)).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(
        sampler
            .saw_stopped
            .load(std::sync::atomic::Ordering::SeqCst),
        "the detached observer never saw the pool stopped from inside a tick"
    );
    pool.shutdown().await;
}
