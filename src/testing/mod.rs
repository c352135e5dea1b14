//! Testing utilities for crates embedding the job pool.
//!
//! This module provides job doubles for exercising scheduling behavior:
//!
//! - [`CountingJob`]: counts executions, with a switchable readiness gate
//! - [`FailingJob`]: fails every Nth call and records the failed/restored
//!   transitions the pool drives it through

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::core::job::{Job, JobError};

/// A job that counts its executions.
///
/// Readiness is switchable, so tests can hold an execution in
/// `Initializing` and release it later.
pub struct CountingJob {
    ready: AtomicBool,
    executions: AtomicU32,
    run_time: Duration,
}

impl CountingJob {
    /// Create a ready job that executes instantly.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            ready: AtomicBool::new(true),
            executions: AtomicU32::new(0),
            run_time: Duration::ZERO,
        })
    }

    /// Create a job whose readiness gate starts closed.
    pub fn unready() -> Arc<Self> {
        Arc::new(Self {
            ready: AtomicBool::new(false),
            executions: AtomicU32::new(0),
            run_time: Duration::ZERO,
        })
    }

    /// Create a ready job whose `execute` takes `run_time` to complete.
    pub fn with_run_time(run_time: Duration) -> Arc<Self> {
        Arc::new(Self {
            ready: AtomicBool::new(true),
            executions: AtomicU32::new(0),
            run_time,
        })
    }

    /// Open or close the readiness gate.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Number of completed `execute` calls.
    pub fn executions(&self) -> u32 {
        self.executions.load(Ordering::SeqCst)
    }

    /// Reset the execution counter.
    pub fn reset(&self) {
        self.executions.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl Job for CountingJob {
    fn ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn status(&self) -> Result<(), JobError> {
        Ok(())
    }

    async fn execute(&self) -> Result<(), JobError> {
        if !self.run_time.is_zero() {
            tokio::time::sleep(self.run_time).await;
        }
        self.executions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A job that fails on every Nth call.
///
/// Records whether it ever failed and whether its readiness gate was
/// re-polled after a failure, which is how the pool marks an execution
/// restored.
pub struct FailingJob {
    executions: AtomicU32,
    calls: AtomicU32,
    fail_every: u32,
    was_failed: AtomicBool,
    was_restored: AtomicBool,
}

impl FailingJob {
    /// Create a job that fails on every `n`th call.
    pub fn fail_every(n: u32) -> Arc<Self> {
        assert!(n > 0, "fail_every cannot be zero");
        Arc::new(Self {
            executions: AtomicU32::new(0),
            calls: AtomicU32::new(0),
            fail_every: n,
            was_failed: AtomicBool::new(false),
            was_restored: AtomicBool::new(false),
        })
    }

    /// Number of successful `execute` calls.
    pub fn executions(&self) -> u32 {
        self.executions.load(Ordering::SeqCst)
    }

    /// Reset the success counter (the failed/restored flags are kept).
    pub fn reset(&self) {
        self.executions.store(0, Ordering::SeqCst);
    }

    /// Whether the job ever reported a failure.
    pub fn was_failed(&self) -> bool {
        self.was_failed.load(Ordering::SeqCst)
    }

    /// Whether readiness was re-polled after a failure.
    pub fn was_restored(&self) -> bool {
        self.was_restored.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Job for FailingJob {
    fn ready(&self) -> bool {
        // The pool only re-polls readiness when it restores a parked
        // execution, so a ready() after a failure means restoration.
        if self.was_failed.load(Ordering::SeqCst) {
            self.was_restored.store(true, Ordering::SeqCst);
        }
        true
    }

    fn status(&self) -> Result<(), JobError> {
        Ok(())
    }

    async fn execute(&self) -> Result<(), JobError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call % self.fail_every == 0 {
            self.was_failed.store(true, Ordering::SeqCst);
            return Err(JobError::ExecutionFailed(format!(
                "planned failure on call {}",
                call
            )));
        }
        self.executions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
