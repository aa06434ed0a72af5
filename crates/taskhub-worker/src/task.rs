//! Scheduled task — a named binding of a callback to a cron expression.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use tracing;

use taskhub_core::error::AppError;

use crate::cron::{CronError, CronExpression};

/// Zero-argument async callback bound to a scheduled task.
pub type TaskCallback = Arc<dyn Fn() -> BoxFuture<'static, Result<(), AppError>> + Send + Sync>;

/// A named recurring task.
///
/// `next_run`, when set, is always the earliest instant after the moment it
/// was last computed that satisfies the cron expression; it is recomputed at
/// construction, after every run, and after every expression change.
///
/// There is no guard against overlapping runs of the same task if sweeps are
/// triggered faster than a run completes; the host must keep sweeps from
/// overlapping or make the callback idempotent.
#[derive(Clone)]
pub struct ScheduledTask {
    name: String,
    callback: TaskCallback,
    expression: CronExpression,
    enabled: bool,
    last_run: Option<DateTime<Utc>>,
    next_run: Option<DateTime<Utc>>,
}

impl fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("name", &self.name)
            .field("cron", &self.expression.source())
            .field("enabled", &self.enabled)
            .field("last_run", &self.last_run)
            .field("next_run", &self.next_run)
            .finish()
    }
}

impl ScheduledTask {
    /// Create a task bound to a cron expression, enabled, with its first
    /// `next_run` computed from now.
    pub fn new(
        name: impl Into<String>,
        cron: &str,
        callback: TaskCallback,
    ) -> Result<Self, CronError> {
        let expression = CronExpression::parse(cron)?;
        let next_run = Some(expression.next_after(Utc::now()));
        Ok(Self {
            name: name.into(),
            callback,
            expression,
            enabled: true,
            last_run: None,
            next_run,
        })
    }

    /// The task's unique name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bound cron expression source.
    pub fn cron(&self) -> &str {
        self.expression.source()
    }

    /// Whether the task participates in sweeps.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// When the task last ran, if ever.
    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        self.last_run
    }

    /// The next instant the task is due, if scheduled.
    pub fn next_run(&self) -> Option<DateTime<Utc>> {
        self.next_run
    }

    /// Enable the task.
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Disable the task; `run` becomes a no-op and `is_due` reports false.
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Replace the cron expression and recompute `next_run`.
    pub fn set_cron(&mut self, cron: &str) -> Result<(), CronError> {
        self.expression = CronExpression::parse(cron)?;
        self.next_run = Some(self.expression.next_after(Utc::now()));
        Ok(())
    }

    /// Schedule daily at the given hour and minute.
    pub fn daily(&mut self, hour: u32, minute: u32) -> Result<(), CronError> {
        self.set_cron(&format!("{minute} {hour} * * *"))
    }

    /// Schedule hourly at the given minute.
    pub fn hourly(&mut self, minute: u32) -> Result<(), CronError> {
        self.set_cron(&format!("{minute} * * * *"))
    }

    /// Whether the task is due at the given instant.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.enabled && self.next_run.is_some_and(|next| next <= now)
    }

    /// Run the task once.
    ///
    /// No-op when disabled. A callback error is logged and never propagated;
    /// `last_run` and `next_run` are updated regardless of the outcome so a
    /// failing task does not re-fire every sweep.
    pub async fn run(&mut self) {
        self.run_at(Utc::now()).await;
    }

    /// Run the task with an explicit notion of "now" for the bookkeeping.
    pub async fn run_at(&mut self, now: DateTime<Utc>) {
        if !self.enabled {
            return;
        }

        tracing::debug!("Running scheduled task '{}'", self.name);
        if let Err(e) = (self.callback)().await {
            tracing::error!("Scheduled task '{}' failed: {}", self.name, e);
        }

        self.last_run = Some(now);
        self.next_run = Some(self.expression.next_after(now));
    }
}
