//! Pool supervisor and circuit breaker.
//!
//! The pool owns the registry of job executions, the single-consumer failure
//! channel, and the pause/resume broadcast. One failing non-detached
//! execution pauses every other non-detached execution; after the retry
//! interval all of them are resumed and re-validate their own readiness.
//! Failures pause, never destroy: nothing here terminates the host process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{RwLock, mpsc, watch};
use tokio::task::JoinHandle;

use crate::config::PoolConfig;
use crate::core::job::Job;
use crate::core::schedule::CronSchedule;
use crate::core::types::{ExecutionId, ExecutionStatus, JobKind, PoolStatus};
use crate::events::{Event, EventBus};
use crate::pool::{
    ExecutionContext, ExecutionHandle, FailureReport, JobExecution, PoolError, Timing,
};

/// Buffer size for the failure-report channel between executions and the
/// supervisor.
const FAILURE_CHANNEL_BUFFER: usize = 32;

/// A supervised pool of recurring job executions.
///
/// Construct one per hosting process and pass it by reference (or clone; all
/// clones share the same pool) to every registration call site. Independent
/// pools are fully isolated, which keeps tests hermetic.
#[derive(Clone)]
pub struct Pool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    executions: RwLock<HashMap<ExecutionId, ExecutionHandle>>,
    /// Aggregate status; doubles as the pause/resume broadcast every
    /// non-detached loop listens on.
    signal: watch::Sender<PoolStatus>,
    failures: mpsc::Sender<FailureReport>,
    events: Arc<EventBus>,
    config: PoolConfig,
    supervisor: Mutex<Option<JoinHandle<()>>>,
}

impl Pool {
    /// Create a pool with default configuration and start its supervisor.
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Create a pool with the given configuration and start its supervisor.
    ///
    /// Must be called from within a tokio runtime; the supervisor and every
    /// registered execution run as tasks on it.
    pub fn with_config(config: PoolConfig) -> Self {
        let (signal_tx, _signal_rx) = watch::channel(PoolStatus::Running);
        let (failure_tx, failure_rx) = mpsc::channel(FAILURE_CHANNEL_BUFFER);
        let events = Arc::new(EventBus::new());

        let supervisor = tokio::spawn(supervise(
            failure_rx,
            signal_tx.clone(),
            Arc::clone(&events),
            config.retry_interval(),
        ));

        Self {
            inner: Arc::new(PoolInner {
                executions: RwLock::new(HashMap::new()),
                signal: signal_tx,
                failures: failure_tx,
                events,
                config,
                supervisor: Mutex::new(Some(supervisor)),
            }),
        }
    }

    /// Register a job that executes on a fixed period.
    ///
    /// The execution loop is started before this call returns; the job begins
    /// ticking once its readiness gate passes.
    pub async fn register_interval_job(
        &self,
        job: Arc<dyn Job>,
        period: Duration,
    ) -> Result<ExecutionHandle, PoolError> {
        self.register(job, JobKind::Interval, Timing::Period(period))
            .await
    }

    /// Register a job that executes on a cron schedule.
    ///
    /// The expression is seconds-first with six or seven fields; an invalid
    /// expression fails here with no execution created.
    pub async fn register_scheduled_job(
        &self,
        job: Arc<dyn Job>,
        cron_expression: &str,
    ) -> Result<ExecutionHandle, PoolError> {
        let schedule =
            CronSchedule::parse(cron_expression).map_err(|source| PoolError::Registration {
                kind: JobKind::Scheduled,
                source,
            })?;
        self.register(job, JobKind::Scheduled, Timing::Cron(schedule))
            .await
    }

    /// Register a fixed-period job whose failures bypass the circuit breaker.
    ///
    /// Detached executions are never paused by the pool; use them for work
    /// that must keep running (and keep reading [`Pool::status`]) while the
    /// pool itself is stopped.
    pub async fn register_detached_interval_job(
        &self,
        job: Arc<dyn Job>,
        period: Duration,
    ) -> Result<ExecutionHandle, PoolError> {
        self.register(job, JobKind::DetachedInterval, Timing::Period(period))
            .await
    }

    async fn register(
        &self,
        job: Arc<dyn Job>,
        kind: JobKind,
        timing: Timing,
    ) -> Result<ExecutionHandle, PoolError> {
        if let Timing::Period(period) = &timing {
            if period.is_zero() {
                return Err(PoolError::InvalidPeriod { kind });
            }
        }

        let handle = JobExecution::spawn(
            job,
            kind,
            timing,
            ExecutionContext {
                pool_signal: self.inner.signal.subscribe(),
                failures: self.inner.failures.clone(),
                events: Arc::clone(&self.inner.events),
                ready_poll_interval: self.inner.config.ready_poll_interval(),
            },
        );

        tracing::debug!(execution_id = %handle.id(), kind = %kind, "registered job");
        let mut executions = self.inner.executions.write().await;
        executions.insert(handle.id(), handle.clone());
        Ok(handle)
    }

    /// Current aggregate pool status.
    ///
    /// `Stopped` exactly while the pool is inside a pause window; stable
    /// across repeated calls when no new failures arrive.
    pub fn status(&self) -> PoolStatus {
        *self.inner.signal.borrow()
    }

    /// Status of a single execution, if it is registered.
    pub async fn execution_status(&self, id: ExecutionId) -> Option<ExecutionStatus> {
        let executions = self.inner.executions.read().await;
        executions.get(&id).map(|handle| handle.status())
    }

    /// Number of registered executions.
    pub async fn execution_count(&self) -> usize {
        self.inner.executions.read().await.len()
    }

    /// The pool's event bus, for registering lifecycle event handlers.
    pub fn event_bus(&self) -> &EventBus {
        &self.inner.events
    }

    /// Stop every execution loop and the supervisor.
    ///
    /// This is the only teardown path; transient failures pause executions
    /// but never destroy them.
    pub async fn shutdown(&self) {
        let mut executions = self.inner.executions.write().await;
        for handle in executions.values() {
            handle.stop();
        }
        executions.clear();

        if let Some(supervisor) = self
            .inner
            .supervisor
            .lock()
            .expect("lock poisoned")
            .take()
        {
            supervisor.abort();
        }
        tracing::info!("job pool shut down");
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}

/// Supervisor loop: wait for a failure, pause everything non-detached, wait
/// out the retry interval, resume, repeat.
///
/// Resumption is unconditional; each execution re-validates its own
/// readiness after the broadcast.
async fn supervise(
    mut failures: mpsc::Receiver<FailureReport>,
    signal: watch::Sender<PoolStatus>,
    events: Arc<EventBus>,
    retry_interval: Duration,
) {
    while let Some(report) = failures.recv().await {
        tracing::warn!(
            execution_id = %report.id,
            kind = %report.kind,
            error = %report.error,
            "job execution failed, pausing pool"
        );
        signal.send_replace(PoolStatus::Stopped);
        events.emit(Event::pool_paused(report.id)).await;

        tokio::time::sleep(retry_interval).await;

        signal.send_replace(PoolStatus::Running);
        events.emit(Event::pool_resumed()).await;
        tracing::info!("pool resumed after retry interval");
    }
}
