//! Core identifier and status types for the job pool.
//!
//! These types are shared between the pool, its execution loops, and the
//! status aggregation layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a registered job execution.
///
/// Generated at registration time and never reused for the lifetime of the
/// pool process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionId(Uuid);

impl ExecutionId {
    /// Generate a new random ExecutionId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an ExecutionId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The scheduling strategy attached to an execution at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobKind {
    /// Fixed-period ticker, reset after every tick.
    Interval,
    /// Cron-scheduled; next fire recomputed from wall-clock after every fire.
    Scheduled,
    /// Fixed-period ticker whose failures bypass the pool circuit breaker.
    DetachedInterval,
}

impl JobKind {
    /// Whether failures of this kind bypass the pool circuit breaker.
    pub fn is_detached(&self) -> bool {
        matches!(self, JobKind::DetachedInterval)
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Interval => write!(f, "interval"),
            JobKind::Scheduled => write!(f, "scheduled"),
            JobKind::DetachedInterval => write!(f, "detached interval"),
        }
    }
}

/// State of a single job execution loop.
///
/// The sequence is always `Initializing → Running → (Stopped → Running)*`.
/// An execution only leaves `Initializing` once its job has reported ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Waiting for the job to report ready.
    Initializing,
    /// Executing on schedule.
    Running,
    /// Parked, either after its own failure or by a pool-wide pause.
    Stopped,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionStatus::Initializing => write!(f, "initializing"),
            ExecutionStatus::Running => write!(f, "running"),
            ExecutionStatus::Stopped => write!(f, "stopped"),
        }
    }
}

/// Aggregate pool state.
///
/// `Stopped` exactly while the pool is inside a pause window triggered by a
/// non-detached execution failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolStatus {
    /// All non-parked executions are ticking.
    Running,
    /// Pause window after a failure; resumes after the retry interval.
    Stopped,
}

impl fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolStatus::Running => write!(f, "running"),
            PoolStatus::Stopped => write!(f, "stopped"),
        }
    }
}
