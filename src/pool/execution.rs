//! Per-job execution loops.
//!
//! A `JobExecution` wraps one registered job with its scheduling strategy and
//! drives it from a dedicated task. The loop owns the execution's status and
//! last error; the pool only reaches in through the pause/resume broadcast
//! and the stop signal.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{Notify, mpsc, watch};

use crate::core::job::{Job, JobError};
use crate::core::schedule::CronSchedule;
use crate::core::types::{ExecutionId, ExecutionStatus, JobKind, PoolStatus};
use crate::events::{Event, EventBus};
use crate::pool::{ExecutionFailure, FailureReport};

/// Kind-specific timing state, fixed at registration.
#[derive(Debug, Clone)]
pub(crate) enum Timing {
    /// Fixed period, re-armed after every tick regardless of outcome.
    Period(Duration),
    /// Cron schedule; next fire recomputed from the wall clock after every fire.
    Cron(CronSchedule),
}

/// Channels and settings an execution shares with its pool.
pub(crate) struct ExecutionContext {
    pub(crate) pool_signal: watch::Receiver<PoolStatus>,
    pub(crate) failures: mpsc::Sender<FailureReport>,
    pub(crate) events: Arc<EventBus>,
    pub(crate) ready_poll_interval: Duration,
}

/// Handle to a registered execution, returned from the pool's `register_*`
/// operations.
///
/// Cheap to clone; reads the status and last error published by the loop.
#[derive(Clone)]
pub struct ExecutionHandle {
    id: ExecutionId,
    kind: JobKind,
    status: watch::Receiver<ExecutionStatus>,
    last_error: Arc<Mutex<Option<Arc<ExecutionFailure>>>>,
    stop: Arc<Notify>,
}

impl ExecutionHandle {
    /// The execution's unique id.
    pub fn id(&self) -> ExecutionId {
        self.id
    }

    /// The scheduling strategy this execution was registered with.
    pub fn kind(&self) -> JobKind {
        self.kind
    }

    /// Current state of the execution loop.
    pub fn status(&self) -> ExecutionStatus {
        *self.status.borrow()
    }

    /// The most recent execution failure, retained for diagnostics.
    pub fn last_error(&self) -> Option<Arc<ExecutionFailure>> {
        self.last_error.lock().expect("lock poisoned").clone()
    }

    /// Signal the loop to exit permanently. Pool shutdown only.
    pub(crate) fn stop(&self) {
        self.stop.notify_one();
    }
}

impl std::fmt::Debug for ExecutionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionHandle")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("status", &self.status())
            .finish()
    }
}

/// Why the ticking loop handed control back to the outer state machine.
enum Exit {
    /// Stop signal received; the loop ends permanently.
    Shutdown,
    /// The pool broadcast a pause; park until resume.
    Paused,
    /// The job's `execute` returned an error.
    Failed(JobError),
}

/// One registered job bound to its scheduling strategy and state machine.
pub(crate) struct JobExecution {
    id: ExecutionId,
    kind: JobKind,
    job: Arc<dyn Job>,
    timing: Timing,
    status_tx: watch::Sender<ExecutionStatus>,
    last_error: Arc<Mutex<Option<Arc<ExecutionFailure>>>>,
    stop: Arc<Notify>,
    pool_signal: watch::Receiver<PoolStatus>,
    failures: mpsc::Sender<FailureReport>,
    events: Arc<EventBus>,
    ready_poll_interval: Duration,
}

impl JobExecution {
    /// Create the execution and start its loop on a new task.
    pub(crate) fn spawn(
        job: Arc<dyn Job>,
        kind: JobKind,
        timing: Timing,
        ctx: ExecutionContext,
    ) -> ExecutionHandle {
        let id = ExecutionId::new();
        let (status_tx, status_rx) = watch::channel(ExecutionStatus::Initializing);
        let stop = Arc::new(Notify::new());
        let last_error = Arc::new(Mutex::new(None));

        let handle = ExecutionHandle {
            id,
            kind,
            status: status_rx,
            last_error: Arc::clone(&last_error),
            stop: Arc::clone(&stop),
        };

        let execution = JobExecution {
            id,
            kind,
            job,
            timing,
            status_tx,
            last_error,
            stop,
            pool_signal: ctx.pool_signal,
            failures: ctx.failures,
            events: ctx.events,
            ready_poll_interval: ctx.ready_poll_interval,
        };

        tokio::spawn(execution.run());
        handle
    }

    /// The full state machine: `Initializing → Running → (Stopped → Running)*`.
    async fn run(mut self) {
        tracing::debug!(execution_id = %self.id, kind = %self.kind, "starting job execution loop");

        let mut was_parked = false;
        loop {
            self.set_status(ExecutionStatus::Initializing);
            if !self.wait_for_ready().await {
                break;
            }

            self.set_status(ExecutionStatus::Running);
            if was_parked {
                tracing::info!(execution_id = %self.id, kind = %self.kind, "job execution restored");
                self.events
                    .emit(Event::execution_restored(self.id, self.kind))
                    .await;
            } else {
                self.events
                    .emit(Event::execution_started(self.id, self.kind))
                    .await;
            }

            match self.tick_loop().await {
                Exit::Shutdown => break,
                Exit::Paused => {
                    self.set_status(ExecutionStatus::Stopped);
                    was_parked = true;
                    // The pause was already observed; only the resume is left.
                    if !self.wait_for_resume(true).await {
                        break;
                    }
                }
                Exit::Failed(err) => {
                    let cause = err.to_string();
                    let failure = ExecutionFailure {
                        id: self.id,
                        kind: self.kind,
                        source: err,
                    };
                    tracing::error!(
                        execution_id = %self.id,
                        kind = %self.kind,
                        error = %cause,
                        "job execution failed"
                    );
                    self.set_status(ExecutionStatus::Stopped);
                    self.events
                        .emit(Event::execution_failed(self.id, self.kind, cause.clone()))
                        .await;
                    let report = FailureReport {
                        id: self.id,
                        kind: self.kind,
                        error: cause,
                    };
                    *self.last_error.lock().expect("lock poisoned") = Some(Arc::new(failure));
                    was_parked = true;

                    if self.kind.is_detached() {
                        // Detached failures never reach the breaker; the loop
                        // goes straight back to revalidating readiness.
                        continue;
                    }
                    if self.failures.send(report).await.is_err() {
                        // Supervisor is gone; nothing will ever resume us.
                        break;
                    }
                    if !self.wait_for_resume(false).await {
                        break;
                    }
                }
            }
        }

        self.set_status(ExecutionStatus::Stopped);
        tracing::debug!(execution_id = %self.id, kind = %self.kind, "job execution loop exited");
    }

    /// Poll the job's readiness gate until it passes.
    ///
    /// Returns false only when the stop signal arrives first. Readiness that
    /// never comes is not an error; the execution stays in `Initializing`.
    async fn wait_for_ready(&mut self) -> bool {
        loop {
            if self.job.ready() {
                return true;
            }
            tokio::select! {
                _ = self.stop.notified() => return false,
                _ = tokio::time::sleep(self.ready_poll_interval) => {}
            }
        }
    }

    /// Fire the job on schedule until stopped, paused, or failed.
    ///
    /// The pause broadcast is only observed here, between ticks; an in-flight
    /// `execute` always runs to completion first.
    async fn tick_loop(&mut self) -> Exit {
        loop {
            let delay = match &self.timing {
                Timing::Period(period) => *period,
                Timing::Cron(schedule) => match schedule.until_next() {
                    Ok(delay) => delay,
                    Err(err) => {
                        tracing::warn!(
                            execution_id = %self.id,
                            error = %err,
                            "schedule has no further occurrences, stopping loop"
                        );
                        return Exit::Shutdown;
                    }
                },
            };

            let detached = self.kind.is_detached();
            let stop = &self.stop;
            let signal = &mut self.pool_signal;
            tokio::select! {
                _ = stop.notified() => return Exit::Shutdown,
                _ = Self::pool_paused(signal), if !detached => return Exit::Paused,
                _ = tokio::time::sleep(delay) => {}
            }

            if let Err(err) = self.job.execute().await {
                return Exit::Failed(err);
            }
        }
    }

    /// Resolve when the pool broadcast flips to `Stopped`.
    async fn pool_paused(signal: &mut watch::Receiver<PoolStatus>) {
        match signal
            .wait_for(|status| *status == PoolStatus::Stopped)
            .await
            .map(|_| ())
        {
            Ok(()) => {}
            // Pool dropped without shutdown; no pause can ever arrive.
            Err(_) => std::future::pending().await,
        }
    }

    /// Park until the pool completes a pause window.
    ///
    /// When this execution reported the failure itself, the pause has not
    /// been broadcast yet: first observe `Stopped` (guaranteed, since the
    /// supervisor handles every report), then `Running`. When the pause was
    /// already observed, only the resume is awaited. Returns false if the
    /// stop signal arrives or the pool is gone.
    async fn wait_for_resume(&mut self, pause_observed: bool) -> bool {
        let signal = &mut self.pool_signal;
        let stop = &self.stop;
        let resumed = async move {
            if !pause_observed
                && signal
                    .wait_for(|status| *status == PoolStatus::Stopped)
                    .await
                    .is_err()
            {
                return false;
            }
            signal
                .wait_for(|status| *status == PoolStatus::Running)
                .await
                .is_ok()
        };
        tokio::select! {
            _ = stop.notified() => false,
            resumed = resumed => resumed,
        }
    }

    fn set_status(&self, status: ExecutionStatus) {
        self.status_tx.send_replace(status);
    }
}
