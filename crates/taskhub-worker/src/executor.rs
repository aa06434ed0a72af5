//! Job executor — dispatches jobs to registered handlers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing;

use taskhub_core::error::AppError;
use taskhub_queue::job::Job;

/// Trait for job handler implementations.
///
/// One handler is registered per job type; the payload is interpreted by the
/// handler. `failed` is the terminal failure hook, invoked exactly once when
/// a job has exhausted its retries (or failed permanently).
#[async_trait]
pub trait JobHandler: Send + Sync + std::fmt::Debug {
    /// Get the job type this handler processes.
    fn job_type(&self) -> &str;

    /// Execute the job with the given payload.
    async fn execute(&self, job: &Job) -> Result<Option<Value>, JobExecutionError>;

    /// Terminal failure hook; the job will not be re-enqueued after this.
    async fn failed(&self, job: &Job, error: &JobExecutionError) {
        let _ = (job, error);
    }
}

/// Error from job execution.
#[derive(Debug, thiserror::Error)]
pub enum JobExecutionError {
    /// Transient failure; retried until attempts are exhausted.
    #[error("Transient job failure: {0}")]
    Transient(String),

    /// Permanent failure; skips any remaining retries.
    #[error("Permanent job failure: {0}")]
    Permanent(String),

    /// Internal error; treated as retryable.
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

impl JobExecutionError {
    /// Whether the worker may re-enqueue the job for another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::Internal(_))
    }
}

/// Dispatches jobs to the appropriate handler based on `job_type`.
#[derive(Debug, Default)]
pub struct JobExecutor {
    /// Registered job handlers by type.
    handlers: HashMap<String, Arc<dyn JobHandler>>,
}

impl JobExecutor {
    /// Create a new job executor with no handlers registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job handler.
    pub fn register(&mut self, handler: Arc<dyn JobHandler>) {
        let job_type = handler.job_type().to_string();
        tracing::info!("Registered job handler for type '{}'", job_type);
        self.handlers.insert(job_type, handler);
    }

    /// Execute a job by dispatching to the correct handler.
    ///
    /// A job type with no registered handler is a permanent failure: retrying
    /// cannot make a handler appear.
    pub async fn execute(&self, job: &Job) -> Result<Option<Value>, JobExecutionError> {
        let handler = self.handlers.get(&job.job_type).ok_or_else(|| {
            JobExecutionError::Permanent(format!(
                "No handler registered for job type '{}'",
                job.job_type
            ))
        })?;

        handler.execute(job).await
    }

    /// Invoke the terminal failure hook for a job, if its handler exists.
    pub async fn fail(&self, job: &Job, error: &JobExecutionError) {
        if let Some(handler) = self.handlers.get(&job.job_type) {
            handler.failed(job, error).await;
        }
    }

    /// Check if a handler is registered for a job type.
    pub fn has_handler(&self, job_type: &str) -> bool {
        self.handlers.contains_key(job_type)
    }

    /// Get the list of registered job types.
    pub fn registered_types(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct OkHandler;

    #[async_trait]
    impl JobHandler for OkHandler {
        fn job_type(&self) -> &str {
            "ok"
        }

        async fn execute(&self, job: &Job) -> Result<Option<Value>, JobExecutionError> {
            Ok(Some(job.payload.clone()))
        }
    }

    #[tokio::test]
    async fn test_dispatch_to_registered_handler() {
        let mut executor = JobExecutor::new();
        executor.register(Arc::new(OkHandler));

        let job = Job::new("ok", serde_json::json!({"n": 1}));
        let result = executor.execute(&job).await.unwrap();
        assert_eq!(result, Some(serde_json::json!({"n": 1})));
    }

    #[tokio::test]
    async fn test_missing_handler_is_permanent() {
        let executor = JobExecutor::new();
        let job = Job::new("nope", Value::Null);
        let err = executor.execute(&job).await.unwrap_err();
        assert!(matches!(err, JobExecutionError::Permanent(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_registry_queries() {
        let mut executor = JobExecutor::new();
        assert!(!executor.has_handler("ok"));
        executor.register(Arc::new(OkHandler));
        assert!(executor.has_handler("ok"));
        assert_eq!(executor.registered_types(), vec!["ok".to_string()]);
    }

    #[test]
    fn test_retryable_classification() {
        assert!(JobExecutionError::Transient("x".into()).is_retryable());
        assert!(JobExecutionError::Internal(AppError::internal("x")).is_retryable());
        assert!(!JobExecutionError::Permanent("x".into()).is_retryable());
    }
}
