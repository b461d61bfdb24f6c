//! # codematic-adapter-schedule
//!
//! Cron-based [`Scheduler`] implementation.
//!
//! Each scheduled job is a tokio task that sleeps until the next firing of
//! its expression and sends the firing time to the engine. Cancelling the
//! job aborts the task, which closes the channel.
//!
//! Expressions use the `cron` crate syntax (seconds first). Classic
//! five-field expressions are accepted and get a `0` seconds column:
//!
//! ```text
//! ┌───────────── minute (0 - 59)
//! │ ┌───────────── hour (0 - 23)
//! │ │ ┌───────────── day of month (1 - 31)
//! │ │ │ ┌───────────── month (1 - 12)
//! │ │ │ │ ┌───────────── day of week (MON-SUN)
//! │ │ │ │ │
//! * * * * *
//! ```
//!
//! ## Dependency rule
//!
//! Depends on `codematic-app` and `codematic-domain`.

use std::str::FromStr;

use cron::Schedule;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use codematic_app::ports::{Scheduler, TriggerHandle};
use codematic_domain::error::{CodematicError, ConfigError};
use codematic_domain::rule::ScheduleTrigger;
use codematic_domain::time::{self, Timestamp};

/// Runs each schedule registration as its own tokio task.
#[derive(Debug, Default, Clone, Copy)]
pub struct CronScheduler;

impl CronScheduler {
    /// Parse the registration's expression.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidSchedule`] when it does not parse.
    pub fn parse(trigger: &ScheduleTrigger) -> Result<Schedule, ConfigError> {
        Schedule::from_str(&trigger.normalized_cron()).map_err(|err| {
            ConfigError::InvalidSchedule {
                expression: trigger.cron.clone(),
                reason: err.to_string(),
            }
        })
    }

    /// Check every expression without starting anything.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::InvalidSchedule`].
    pub fn validate<'a>(
        triggers: impl IntoIterator<Item = &'a ScheduleTrigger>,
    ) -> Result<(), ConfigError> {
        for trigger in triggers {
            Self::parse(trigger)?;
        }
        Ok(())
    }
}

/// Sleep until each upcoming firing and send it. Firings missed while the
/// receiver was busy are skipped rather than replayed.
async fn run(schedule: Schedule, firings: mpsc::Sender<Timestamp>) {
    let mut cursor = time::now();
    while let Some(next) = schedule.after(&cursor).next() {
        let wait = (next - time::now()).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;
        if firings.send(next).await.is_err() {
            break;
        }
        cursor = next.max(time::now());
    }
    tracing::debug!("schedule exhausted");
}

struct CronHandle {
    label: String,
    task: JoinHandle<()>,
}

impl TriggerHandle for CronHandle {
    fn label(&self) -> &str {
        &self.label
    }

    fn cancel(self: Box<Self>) {
        self.task.abort();
    }
}

impl Scheduler for CronScheduler {
    fn schedule(
        &self,
        trigger: &ScheduleTrigger,
        firings: mpsc::Sender<Timestamp>,
    ) -> Result<Box<dyn TriggerHandle>, CodematicError> {
        let schedule = Self::parse(trigger)?;
        if let Some(next) = schedule.upcoming(chrono::Utc).next() {
            tracing::info!(cron = %trigger.cron, %next, rule = trigger.rule.label(), "job scheduled");
        }
        Ok(Box::new(CronHandle {
            label: format!("cron {}", trigger.cron),
            task: tokio::spawn(run(schedule, firings)),
        }))
    }
}
