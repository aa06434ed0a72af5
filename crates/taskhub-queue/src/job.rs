//! Job model — one discrete, retryable unit of deferred work.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default maximum number of execution attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default advisory timeout in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

/// Queue name used when a job does not specify one.
pub const DEFAULT_QUEUE: &str = "default";

/// A unit of background work.
///
/// The payload is opaque JSON; the behavior it drives is resolved by the
/// worker through the handler registered for `job_type`. Jobs survive a
/// serde round-trip unchanged, which is what lets them cross the queue
/// backend boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique job identifier.
    pub id: Uuid,
    /// Job type identifier; selects the handler on the worker side.
    pub job_type: String,
    /// Queue name the job is routed to.
    pub queue: String,
    /// Job-specific payload (JSON).
    pub payload: serde_json::Value,
    /// Number of failed execution attempts so far.
    pub attempts: u32,
    /// Maximum allowed attempts before the job is terminal.
    pub max_attempts: u32,
    /// Advisory execution timeout in seconds. Not enforced: a hung job
    /// blocks its worker, which is a known gap of the current design.
    pub timeout_seconds: u64,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Create a new job on the default queue with default retry settings.
    pub fn new(job_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_type: job_type.into(),
            queue: DEFAULT_QUEUE.to_string(),
            payload,
            attempts: 0,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            created_at: Utc::now(),
        }
    }

    /// Route the job to a named queue.
    pub fn with_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = queue.into();
        self
    }

    /// Set the maximum number of execution attempts (including the first).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Set the advisory timeout in seconds.
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Record one failed execution attempt.
    ///
    /// Saturates at `max_attempts` so the `attempts <= max_attempts`
    /// invariant holds after any retry decision.
    pub fn record_failure(&mut self) {
        if self.attempts < self.max_attempts {
            self.attempts += 1;
        }
    }

    /// Whether the job has used up all of its attempts and is terminal.
    pub fn retries_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let job = Job::new("echo", serde_json::json!({"msg": "hi"}));
        assert_eq!(job.queue, "default");
        assert_eq!(job.attempts, 0);
        assert_eq!(job.max_attempts, 3);
        assert_eq!(job.timeout_seconds, 60);
        assert!(!job.retries_exhausted());
    }

    #[test]
    fn test_builder_methods() {
        let job = Job::new("echo", serde_json::Value::Null)
            .with_queue("critical")
            .with_max_attempts(5)
            .with_timeout(120);
        assert_eq!(job.queue, "critical");
        assert_eq!(job.max_attempts, 5);
        assert_eq!(job.timeout_seconds, 120);
    }

    #[test]
    fn test_max_attempts_floor_is_one() {
        let job = Job::new("echo", serde_json::Value::Null).with_max_attempts(0);
        assert_eq!(job.max_attempts, 1);
    }

    #[test]
    fn test_record_failure_saturates() {
        let mut job = Job::new("echo", serde_json::Value::Null).with_max_attempts(2);
        job.record_failure();
        assert_eq!(job.attempts, 1);
        assert!(!job.retries_exhausted());
        job.record_failure();
        assert_eq!(job.attempts, 2);
        assert!(job.retries_exhausted());
        job.record_failure();
        assert_eq!(job.attempts, 2);
    }

    #[test]
    fn test_serde_round_trip() {
        let job = Job::new("report", serde_json::json!({"week": 34}))
            .with_queue("reports")
            .with_max_attempts(4)
            .with_timeout(300);

        let encoded = serde_json::to_string(&job).unwrap();
        let decoded: Job = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded.id, job.id);
        assert_eq!(decoded.job_type, job.job_type);
        assert_eq!(decoded.queue, job.queue);
        assert_eq!(decoded.payload, job.payload);
        assert_eq!(decoded.attempts, job.attempts);
        assert_eq!(decoded.max_attempts, job.max_attempts);
        assert_eq!(decoded.timeout_seconds, job.timeout_seconds);
    }
}
