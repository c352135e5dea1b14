//! Agent status aggregation.
//!
//! Combines the pool's aggregate status with an independently polled
//! health-check subsystem into one reported agent health value, and
//! publishes it upstream when it changes. The health-check subsystem and
//! the upstream propagation mechanism live behind the [`HealthCheck`] and
//! [`StatusPublisher`] traits; only their boundary is specified here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::core::job::{Job, JobError};
use crate::core::types::PoolStatus;
use crate::pool::{ExecutionHandle, Pool, PoolError};

/// Combined agent health reported upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentStatus {
    /// Pool and health checks are both healthy.
    Running,
    /// Either the pool is paused or a health check is failing.
    Unhealthy,
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentStatus::Running => write!(f, "running"),
            AgentStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Result of the health-check subsystem's global probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    Pass,
    Fail,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Pass => write!(f, "pass"),
            HealthStatus::Fail => write!(f, "fail"),
        }
    }
}

/// Boundary to the independent health-check subsystem.
pub trait HealthCheck: Send + Sync {
    /// The subsystem's current global status.
    fn global_status(&self) -> HealthStatus;
}

/// Boundary to the upstream status propagation mechanism.
#[async_trait]
pub trait StatusPublisher: Send + Sync {
    /// Report the combined agent status upstream.
    async fn publish(&self, status: AgentStatus) -> Result<(), JobError>;
}

struct ReporterState {
    prev_status: Option<AgentStatus>,
    previous_activity: DateTime<Utc>,
    current_activity: DateTime<Utc>,
}

/// Periodic status updater.
///
/// Implements [`Job`] and is registered as a DETACHED interval job so it
/// keeps running, and keeps reading [`Pool::status`], while the pool itself
/// is stopped. Publishing requires the agent name prerequisite; while the
/// name is absent, `ready` stays false and `status`/`execute` fail with the
/// distinct prerequisite-missing error.
pub struct StatusReporter {
    pool: Pool,
    health: Arc<dyn HealthCheck>,
    publisher: Arc<dyn StatusPublisher>,
    agent_name: String,
    state: Mutex<ReporterState>,
}

impl StatusReporter {
    /// Create a reporter for the given pool, health check, and publisher.
    ///
    /// An empty `agent_name` marks the identity prerequisite as missing.
    pub fn new(
        pool: Pool,
        health: Arc<dyn HealthCheck>,
        publisher: Arc<dyn StatusPublisher>,
        agent_name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            pool,
            health,
            publisher,
            agent_name: agent_name.into(),
            state: Mutex::new(ReporterState {
                prev_status: None,
                previous_activity: now,
                current_activity: now,
            }),
        }
    }

    /// Record local activity so the next `execute` publishes an update.
    pub fn record_activity(&self) {
        self.state.lock().expect("lock poisoned").current_activity = Utc::now();
    }

    /// Combined health: unhealthy if either the pool or the health-check
    /// subsystem is unhealthy.
    pub fn combined_status(&self) -> AgentStatus {
        if self.pool.status() == PoolStatus::Stopped {
            return AgentStatus::Unhealthy;
        }
        if self.health.global_status() == HealthStatus::Fail {
            return AgentStatus::Unhealthy;
        }
        AgentStatus::Running
    }

    fn prerequisite_check(&self) -> Result<(), JobError> {
        if self.agent_name.is_empty() {
            return Err(JobError::PrerequisiteMissing("agent name".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Job for StatusReporter {
    fn ready(&self) -> bool {
        if self.prerequisite_check().is_err() {
            return false;
        }
        // Hold off until the agent is healthy at least once.
        if self.combined_status() != AgentStatus::Running {
            return false;
        }

        tracing::debug!("periodic status update is ready");
        let now = Utc::now();
        let mut state = self.state.lock().expect("lock poisoned");
        state.current_activity = now;
        state.previous_activity = now;
        true
    }

    fn status(&self) -> Result<(), JobError> {
        self.prerequisite_check()
    }

    async fn execute(&self) -> Result<(), JobError> {
        if let Err(err) = self.prerequisite_check() {
            tracing::error!(error = %err, "periodic status update prerequisite check failed");
            return Err(err);
        }

        let status = self.combined_status();
        {
            let mut state = self.state.lock().expect("lock poisoned");
            // A status flip counts as activity.
            if state.prev_status != Some(status) {
                state.current_activity = Utc::now();
            }
            if state.current_activity <= state.previous_activity {
                return Ok(());
            }
            tracing::trace!(
                current = %state.current_activity,
                previous = %state.previous_activity,
                "activity change detected, updating status"
            );
        }

        self.publisher.publish(status).await?;

        let mut state = self.state.lock().expect("lock poisoned");
        state.prev_status = Some(status);
        state.previous_activity = state.current_activity;
        Ok(())
    }
}

/// Register a periodic status updater with the pool as a detached job.
pub async fn register_status_reporter(
    pool: &Pool,
    reporter: Arc<StatusReporter>,
    period: Duration,
) -> Result<ExecutionHandle, PoolError> {
    pool.register_detached_interval_job(reporter, period).await
}
