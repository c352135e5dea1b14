//! Job trait and error types.
//!
//! The `Job` trait is the capability contract every recurring background task
//! implements. The pool dispatches uniformly through this contract; the
//! scheduling strategy is attached separately at registration.

use async_trait::async_trait;
use thiserror::Error;

/// Errors returned by a job's `status` or `execute` operations.
#[derive(Debug, Error)]
pub enum JobError {
    /// The unit of work failed with a message.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// A configuration value the job depends on is absent.
    #[error("missing prerequisite: {0}")]
    PrerequisiteMissing(String),

    /// Generic error wrapper.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// The contract implemented by every recurring background task.
///
/// The three operations are independently meaningful:
///
/// - `ready` gates scheduling: it is polled before the first execution and
///   again after every pool-initiated resume. Returning false parks the
///   execution in `Initializing` and is never treated as a failure.
/// - `status` is a liveness probe read by status aggregation; the pool's
///   circuit breaker never consults it.
/// - `execute` performs the unit of work. Returning an error is the sole
///   failure signal the scheduler acts on.
///
/// # Example
///
/// ```ignore
/// use roster::{Job, JobError};
/// use async_trait::async_trait;
///
/// struct CacheRefresh;
///
/// #[async_trait]
/// impl Job for CacheRefresh {
///     fn ready(&self) -> bool {
///         true
///     }
///
///     fn status(&self) -> Result<(), JobError> {
///         Ok(())
///     }
///
///     async fn execute(&self) -> Result<(), JobError> {
///         // refresh the cache
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Job: Send + Sync {
    /// Non-blocking readiness gate.
    ///
    /// Polled on a fixed short interval until true; false is not an error.
    fn ready(&self) -> bool;

    /// Liveness probe, independent of scheduling.
    fn status(&self) -> Result<(), JobError>;

    /// Perform the unit of work.
    ///
    /// The pool never preempts or times out this call; a given execution
    /// never runs it concurrently with itself.
    async fn execute(&self) -> Result<(), JobError>;
}
