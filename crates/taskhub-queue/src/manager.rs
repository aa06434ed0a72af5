//! Queue manager — serialization boundary over a pluggable backend.

use std::sync::Arc;

use tracing;

use taskhub_core::error::AppError;
use taskhub_core::result::AppResult;
use taskhub_core::traits::queue::QueueBackend;

use crate::job::Job;

/// Uniform enqueue/dequeue surface over a [`QueueBackend`].
///
/// The manager owns (de)serialization of jobs; the backend only ever sees
/// opaque strings. Backend faults are surfaced to the caller unchanged and
/// never retried here: retry policy belongs to the worker layer.
#[derive(Debug, Clone)]
pub struct QueueManager {
    backend: Arc<dyn QueueBackend>,
}

impl QueueManager {
    /// Create a manager over the given backend.
    pub fn new(backend: Arc<dyn QueueBackend>) -> Self {
        Self { backend }
    }

    /// Enqueue a job onto its queue with immediate visibility.
    pub async fn push(&self, job: &Job) -> AppResult<()> {
        self.push_delayed(job, 0).await
    }

    /// Enqueue a job onto its queue, deferring visibility by `delay_seconds`.
    ///
    /// A serialization failure is reported to the caller as an error; it is
    /// a local, non-fatal condition.
    pub async fn push_delayed(&self, job: &Job, delay_seconds: u64) -> AppResult<()> {
        let entry = serde_json::to_string(job)
            .map_err(|e| AppError::serialization(format!("Failed to serialize job: {e}")))?;

        self.backend.push(&job.queue, &entry, delay_seconds).await?;

        tracing::debug!(
            "Enqueued job: id={}, type='{}', queue='{}', delay={}s",
            job.id,
            job.job_type,
            job.queue,
            delay_seconds
        );
        Ok(())
    }

    /// Dequeue the next job from the named queue.
    ///
    /// Returns `None` when the queue is empty. A corrupt entry is logged and
    /// treated as `None` for this poll; it must never crash the worker loop.
    /// The backend has already removed the entry on `pop`, so a corrupt
    /// entry is dropped rather than redelivered forever.
    pub async fn pop(&self, queue: &str) -> AppResult<Option<Job>> {
        let Some(entry) = self.backend.pop(queue).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<Job>(&entry) {
            Ok(job) => {
                tracing::debug!(
                    "Dequeued job: id={}, type='{}', queue='{}'",
                    job.id,
                    job.job_type,
                    job.queue
                );
                Ok(Some(job))
            }
            Err(e) => {
                tracing::warn!("Dropping corrupt entry on queue '{}': {}", queue, e);
                Ok(None)
            }
        }
    }

    /// Number of entries stored in the named queue.
    pub async fn size(&self, queue: &str) -> AppResult<u64> {
        self.backend.size(queue).await
    }

    /// Remove all entries from the named queue.
    pub async fn clear(&self, queue: &str) -> AppResult<()> {
        self.backend.clear(queue).await?;
        tracing::debug!("Cleared queue '{}'", queue);
        Ok(())
    }
}
