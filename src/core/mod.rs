//! Core contracts and types for the job pool.
//!
//! This module defines the `Job` capability contract, the cron schedule
//! wrapper, and the identifier/status types shared across the crate.

pub mod job;
pub mod schedule;
pub mod types;

pub use job::{Job, JobError};
pub use schedule::{CronSchedule, ScheduleError};
pub use types::{ExecutionId, ExecutionStatus, JobKind, PoolStatus};
