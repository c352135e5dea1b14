//! roster — a supervised pool of recurring background jobs.
//!
//! Integration agents register heterogeneous recurring tasks with a single
//! in-process [`Pool`]: fixed-interval jobs, cron-scheduled jobs, and
//! detached jobs that survive pool-wide pauses. Each registration starts a
//! dedicated execution loop; a failing execution pauses every non-detached
//! loop, and after the retry interval all of them resume and re-validate
//! their own readiness. The pool never terminates the host process.
//!
//! ```ignore
//! use roster::{Pool, PoolConfig};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let pool = Pool::with_config(PoolConfig::new().with_retry_interval(Duration::from_secs(10)));
//! pool.register_interval_job(Arc::new(my_job), Duration::from_secs(30)).await?;
//! pool.register_scheduled_job(Arc::new(nightly_job), "0 0 2 * * *").await?;
//! assert_eq!(pool.status().to_string(), "running");
//! ```

pub mod config;
pub mod core;
pub mod events;
pub mod pool;
pub mod status;
pub mod testing;

pub use config::PoolConfig;
pub use core::job::{Job, JobError};
pub use core::schedule::{CronSchedule, ScheduleError};
pub use core::types::{ExecutionId, ExecutionStatus, JobKind, PoolStatus};
pub use events::{Event, EventBus, EventHandler};
pub use pool::{ExecutionFailure, ExecutionHandle, Pool, PoolError};
pub use status::{
    AgentStatus, HealthCheck, HealthStatus, StatusPublisher, StatusReporter,
    register_status_reporter,
};
