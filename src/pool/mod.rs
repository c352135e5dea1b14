//! The job pool: registration API, execution loops, and the supervisor
//! implementing the pool-wide pause/retry circuit breaker.

mod engine;
mod execution;

pub use engine::Pool;
pub use execution::ExecutionHandle;

pub(crate) use execution::{ExecutionContext, JobExecution, Timing};

use thiserror::Error;

use crate::core::job::JobError;
use crate::core::schedule::ScheduleError;
use crate::core::types::{ExecutionId, JobKind};

/// Errors returned by the pool's registration operations.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The schedule expression could not be parsed; no execution was created.
    #[error("could not register {kind} job: {source}")]
    Registration {
        kind: JobKind,
        #[source]
        source: ScheduleError,
    },

    /// The period for an interval registration was zero.
    #[error("could not register {kind} job: period must be non-zero")]
    InvalidPeriod { kind: JobKind },
}

/// A job execution failure, wrapping the kind, execution id, and cause.
///
/// Retained on the execution as its last error and rendered into failure
/// events and supervisor logs.
#[derive(Debug, Error)]
#[error("{kind} job execution {id} failed: {source}")]
pub struct ExecutionFailure {
    /// The failing execution's id.
    pub id: ExecutionId,
    /// The failing execution's kind.
    pub kind: JobKind,
    /// The error returned by the job's `execute`.
    #[source]
    pub source: JobError,
}

/// Failure report sent from a non-detached execution loop to the supervisor.
#[derive(Debug)]
pub(crate) struct FailureReport {
    pub(crate) id: ExecutionId,
    pub(crate) kind: JobKind,
    pub(crate) error: String,
}
