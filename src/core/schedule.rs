//! Cron schedule parsing and next-fire calculation.
//!
//! Expressions are seconds-first with six or seven whitespace-separated
//! fields (`sec min hour day month weekday [year]`), plus the usual
//! shortcuts (@hourly, @daily, @weekly, @monthly, @yearly).

use chrono::{DateTime, Utc};
use cron::Schedule;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur when parsing or using a cron schedule.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Invalid cron expression.
    #[error("invalid cron expression: {0}")]
    InvalidCron(String),

    /// The schedule has no future occurrence.
    #[error("no more occurrences")]
    NoMoreOccurrences,
}

/// A parsed cron schedule for a job execution.
///
/// Parsed once at registration; the next fire time is recomputed from the
/// current wall-clock time after every fire, so execution duration never
/// causes permanent drift or skipped fires.
#[derive(Debug, Clone)]
pub struct CronSchedule {
    /// The original expression string.
    expression: String,
    schedule: Box<Schedule>,
}

impl CronSchedule {
    /// Parse a seconds-first cron expression.
    ///
    /// Supports:
    /// - Six fields: `second minute hour day month weekday`
    /// - Seven fields: the above plus a trailing year field
    /// - Shortcuts: `@yearly`, `@annually`, `@monthly`, `@weekly`, `@daily`,
    ///   `@midnight`, `@hourly`
    pub fn parse(expression: impl Into<String>) -> Result<Self, ScheduleError> {
        let expression = expression.into();
        let normalized = Self::normalize(expression.trim())?;

        let schedule = Schedule::from_str(&normalized)
            .map_err(|e| ScheduleError::InvalidCron(e.to_string()))?;

        Ok(Self {
            expression,
            schedule: Box::new(schedule),
        })
    }

    /// Expand shortcuts and validate the field count.
    fn normalize(expression: &str) -> Result<String, ScheduleError> {
        if expression.starts_with('@') {
            return Self::expand_shortcut(expression);
        }

        let fields = expression.split_whitespace().count();
        if !(6..=7).contains(&fields) {
            return Err(ScheduleError::InvalidCron(format!(
                "expected 6 or 7 fields, got {}",
                fields
            )));
        }

        Ok(expression.to_string())
    }

    fn expand_shortcut(expression: &str) -> Result<String, ScheduleError> {
        let expanded = match expression.to_lowercase().as_str() {
            "@yearly" | "@annually" => "0 0 0 1 1 *",
            "@monthly" => "0 0 0 1 * *",
            "@weekly" => "0 0 0 * * SUN",
            "@daily" | "@midnight" => "0 0 0 * * *",
            "@hourly" => "0 0 * * * *",
            _ => {
                return Err(ScheduleError::InvalidCron(format!(
                    "unknown shortcut: {}",
                    expression
                )));
            }
        };
        Ok(expanded.to_string())
    }

    /// Get the next occurrence strictly after the given time.
    pub fn next_after(&self, after: DateTime<Utc>) -> Result<DateTime<Utc>, ScheduleError> {
        self.schedule
            .after(&after)
            .next()
            .ok_or(ScheduleError::NoMoreOccurrences)
    }

    /// Duration from now until the next occurrence.
    ///
    /// Recomputed from the wall clock on every call; saturates to zero when
    /// the occurrence is already due.
    pub fn until_next(&self) -> Result<std::time::Duration, ScheduleError> {
        let now = Utc::now();
        let next = self.next_after(now)?;
        Ok((next - now).to_std().unwrap_or_default())
    }

    /// Get the original expression string.
    pub fn expression(&self) -> &str {
        &self.expression
    }
}
