//! Echo job handler — logs the payload and returns it unchanged.
//!
//! Useful for smoke-testing a deployment's queue path end to end.

use async_trait::async_trait;
use serde_json::Value;
use tracing;

use taskhub_queue::job::Job;

use crate::executor::{JobExecutionError, JobHandler};

/// Handles `echo` jobs.
#[derive(Debug, Default)]
pub struct EchoJobHandler;

impl EchoJobHandler {
    /// Create a new echo handler.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl JobHandler for EchoJobHandler {
    fn job_type(&self) -> &str {
        "echo"
    }

    async fn execute(&self, job: &Job) -> Result<Option<Value>, JobExecutionError> {
        tracing::info!("Echo job {}: {}", job.id, job.payload);
        Ok(Some(job.payload.clone()))
    }
}
