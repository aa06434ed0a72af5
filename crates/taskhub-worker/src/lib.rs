//! Background job execution and scheduled tasks for TaskHub.
//!
//! This crate provides:
//! - A worker that polls queues and executes jobs with retry semantics
//! - A job executor that dispatches jobs to the correct handler
//! - A from-scratch five-field cron expression evaluator
//! - Named scheduled tasks and the scheduler that sweeps them

pub mod cron;
pub mod executor;
pub mod jobs;
pub mod runner;
pub mod scheduler;
pub mod task;

pub use cron::CronExpression;
pub use executor::{JobExecutor, JobHandler};
pub use runner::Worker;
pub use scheduler::TaskScheduler;
pub use task::ScheduledTask;
