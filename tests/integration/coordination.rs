//! Pool-wide pause/retry coordination.
//!
//! One failing non-detached execution pauses every other non-detached
//! execution; after the retry interval all of them resume and keep
//! accumulating executions. No job is permanently dropped by a pause.

use roster::testing::{CountingJob, FailingJob};
use roster::{Pool, PoolConfig, PoolStatus};
use std::time::Duration;

use crate::common;

#[tokio::test]
async fn test_pool_coordination_after_failure() {
    common::init_tracing();

    let pool = Pool::with_config(
        PoolConfig::new()
            .with_retry_interval(Duration::from_millis(500))
            .with_ready_poll_interval(Duration::from_millis(10)),
    );

    // Fails for the first time roughly 1.3s in, leaving the every-second
    // cron job a full wall-clock boundary to fire before the pause.
    let fail_job = FailingJob::fail_every(130);
    pool.register_interval_job(fail_job.clone(), Duration::from_millis(10))
        .await
        .unwrap();

    let cron_job = CountingJob::new();
    pool.register_scheduled_job(cron_job.clone(), "* * * * * * *")
        .await
        .unwrap();

    let interval_job = CountingJob::new();
    pool.register_interval_job(interval_job.clone(), Duration::from_millis(10))
        .await
        .unwrap();

    // Poll the pool status for ~4s: long enough for the first failure, the
    // pause window, and a post-resume wall-clock second for the cron job.
    let mut was_stopped = false;
    let mut stopped_then_started = false;
    for _ in 0..400 {
        if !was_stopped && pool.status() == PoolStatus::Stopped {
            was_stopped = true;
            assert!(
                cron_job.executions() >= 1,
                "the cron job did not run at least once before the failure"
            );
            assert!(
                interval_job.executions() >= 1,
                "the interval job did not run at least once before the failure"
            );
            assert!(
                fail_job.executions() >= 1,
                "the failing job did not run at least once before the failure"
            );
            cron_job.reset();
            interval_job.reset();
            fail_job.reset();
        }
        if was_stopped && pool.status() == PoolStatus::Running {
            stopped_then_started = true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert!(was_stopped, "the pool status never showed as stopped");
    assert!(
        stopped_then_started,
        "the pool never restarted after it was stopped"
    );
    assert!(
        cron_job.executions() >= 1,
        "the cron job did not run at least once after the restart"
    );
    assert!(
        interval_job.executions() >= 1,
        "the interval job did not run at least once after the restart"
    );
    assert!(
        fail_job.executions() >= 1,
        "the failing job did not run at least once after the restart"
    );
    assert!(
        fail_job.was_failed(),
        "the failing job never reported as failed"
    );
    assert!(
        fail_job.was_restored(),
        "the failing job was not restored after the failure"
    );

    pool.shutdown().await;
}

#[tokio::test]
async fn test_pool_survives_repeated_failure_cycles() {
    common::init_tracing();

    let pool = Pool::with_config(
        PoolConfig::new()
            .with_retry_interval(Duration::from_millis(50))
            .with_ready_poll_interval(Duration::from_millis(10)),
    );

    // Fails on every 3rd call: several pause/resume cycles per second.
    let fail_job = FailingJob::fail_every(3);
    pool.register_interval_job(fail_job.clone(), Duration::from_millis(10))
        .await
        .unwrap();

    let healthy = CountingJob::new();
    pool.register_interval_job(healthy.clone(), Duration::from_millis(10))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(1)).await;

    // Multiple cycles completed, and both jobs are still being scheduled.
    assert!(fail_job.was_failed());
    assert!(fail_job.was_restored());
    assert!(fail_job.executions() >= 2);
    assert!(healthy.executions() >= 2);

    // The pool always comes back.
    common::wait_for_pool_status(&pool, PoolStatus::Running, Duration::from_secs(1)).await;
    pool.shutdown().await;
}

#[tokio::test]
async fn test_non_detached_executions_park_during_pause() {
    common::init_tracing();

    let pool = Pool::with_config(
        PoolConfig::new()
            .with_retry_interval(Duration::from_millis(600))
            .with_ready_poll_interval(Duration::from_millis(10)),
    );

    let fail_job = FailingJob::fail_every(1);
    pool.register_interval_job(fail_job, Duration::from_millis(10))
        .await
        .unwrap();

    let bystander = CountingJob::new();
    pool.register_interval_job(bystander.clone(), Duration::from_millis(10))
        .await
        .unwrap();

    common::wait_for_pool_status(&pool, PoolStatus::Stopped, Duration::from_secs(1)).await;

    // Give the bystander a moment to reach its safe point and park.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let parked_at = bystander.executions();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(
        bystander.executions(),
        parked_at,
        "a non-detached job kept executing during the pool pause"
    );

    pool.shutdown().await;
}
