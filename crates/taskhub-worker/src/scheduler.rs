//! Task scheduler — registry of scheduled tasks swept for due-ness.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time;
use tracing;

use crate::task::ScheduledTask;

/// Registry of named scheduled tasks.
///
/// Tasks are swept in registration order; re-registering a name replaces the
/// previous task in place. Sweeps are sequential, so a slow task delays the
/// tasks after it within the same sweep. The scheduler does not self-trigger:
/// [`TaskScheduler::sweep`] must be invoked periodically by the host, either
/// directly or through [`TaskScheduler::run`].
#[derive(Debug, Default)]
pub struct TaskScheduler {
    tasks: Vec<ScheduledTask>,
}

impl TaskScheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task. A task with the same name replaces the existing one
    /// in place, keeping its position in the sweep order.
    pub fn register(&mut self, task: ScheduledTask) {
        match self.tasks.iter_mut().find(|t| t.name() == task.name()) {
            Some(existing) => {
                tracing::info!("Replacing scheduled task '{}'", task.name());
                *existing = task;
            }
            None => {
                tracing::info!("Registered scheduled task '{}' ({})", task.name(), task.cron());
                self.tasks.push(task);
            }
        }
    }

    /// Remove a task by name.
    pub fn remove(&mut self, name: &str) -> Option<ScheduledTask> {
        let idx = self.tasks.iter().position(|t| t.name() == name)?;
        Some(self.tasks.remove(idx))
    }

    /// Look up a task by name.
    pub fn get(&self, name: &str) -> Option<&ScheduledTask> {
        self.tasks.iter().find(|t| t.name() == name)
    }

    /// Mutable look-up, for enabling/disabling or rescheduling a task.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut ScheduledTask> {
        self.tasks.iter_mut().find(|t| t.name() == name)
    }

    /// Task names in sweep order.
    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.name()).collect()
    }

    /// Number of registered tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no tasks are registered.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Sweep the registry once, running every due task sequentially.
    ///
    /// A task's failure is caught inside [`ScheduledTask::run`]; it never
    /// aborts the sweep or propagates to the caller.
    pub async fn sweep(&mut self) {
        self.sweep_at(Utc::now()).await;
    }

    /// Sweep with an explicit notion of "now", for deterministic testing.
    pub async fn sweep_at(&mut self, now: DateTime<Utc>) {
        for task in &mut self.tasks {
            if task.is_due(now) {
                task.run_at(now).await;
            }
        }
    }

    /// Sweep repeatedly at the given interval until cancelled.
    ///
    /// This is the periodic external trigger, hosted by the daemon. Sweeps
    /// never overlap within this loop; re-entrancy is only possible if the
    /// host drives `sweep` concurrently from elsewhere.
    pub async fn run(&mut self, mut cancel: watch::Receiver<bool>, interval: Duration) {
        tracing::info!(
            "Task scheduler started with {} task(s), sweep interval {:?}",
            self.tasks.len(),
            interval
        );

        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        tracing::info!("Task scheduler received shutdown signal");
                        break;
                    }
                }
                _ = time::sleep(interval) => {
                    self.sweep().await;
                }
            }
        }

        tracing::info!("Task scheduler stopped");
    }
}
