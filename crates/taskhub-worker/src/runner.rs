//! Worker — main loop that polls queues and executes jobs.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tracing;

use taskhub_core::config::worker::WorkerConfig;
use taskhub_core::result::AppResult;
use taskhub_queue::job::Job;
use taskhub_queue::manager::QueueManager;

use crate::executor::{JobExecutionError, JobExecutor};

/// Observable worker lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Between iterations, nothing in flight.
    Idle,
    /// Checking queues for work.
    Polling,
    /// Running a job.
    Executing,
    /// Shutdown requested or memory ceiling breached; finishing the current
    /// iteration.
    Stopping,
    /// Loop exited.
    Stopped,
}

impl WorkerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Polling,
            2 => Self::Executing,
            3 => Self::Stopping,
            _ => Self::Stopped,
        }
    }
}

/// A polling worker bound to one or more named queues.
///
/// Processes exactly one job at a time; non-duplicate delivery across
/// concurrent workers rests entirely on the backend's atomic pop. Shutdown
/// is cooperative: [`Worker::stop`] is observed at loop boundaries and never
/// preempts an in-flight job.
#[derive(Debug)]
pub struct Worker {
    /// Queue manager for polling and re-enqueueing.
    queue: Arc<QueueManager>,
    /// Job executor for dispatching.
    executor: Arc<JobExecutor>,
    /// Worker configuration.
    config: WorkerConfig,
    /// Worker identifier used in logs.
    worker_id: String,
    /// Queues to poll, in order.
    queues: Vec<String>,
    /// Current lifecycle state.
    state: AtomicU8,
    /// Cooperative shutdown flag.
    shutdown: watch::Sender<bool>,
}

impl Worker {
    /// Create a new worker polling the queues named in the configuration.
    pub fn new(
        queue: Arc<QueueManager>,
        executor: Arc<JobExecutor>,
        config: WorkerConfig,
        worker_id: impl Into<String>,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        let queues = config.queues.clone();
        Self {
            queue,
            executor,
            config,
            worker_id: worker_id.into(),
            queues,
            state: AtomicU8::new(WorkerState::Idle as u8),
            shutdown,
        }
    }

    /// Override the queues to poll.
    pub fn with_queues(mut self, queues: Vec<String>) -> Self {
        self.queues = queues;
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Request a cooperative stop.
    ///
    /// The flag is checked at the top of each loop iteration and during the
    /// empty-queue sleep; an in-flight job always runs to completion. The
    /// embedding application wires its termination signals to this call.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Run the worker loop until [`Worker::stop`] is called or the memory
    /// ceiling is breached.
    pub async fn run(&self) {
        let mut cancel = self.shutdown.subscribe();
        let poll_interval = Duration::from_secs(self.config.poll_interval_seconds);

        tracing::info!(
            "Worker '{}' started with poll_interval={}s, memory_limit={}MiB, queues={:?}",
            self.worker_id,
            self.config.poll_interval_seconds,
            self.config.memory_limit_mb,
            self.queues
        );

        loop {
            if *cancel.borrow() {
                tracing::info!("Worker '{}' received shutdown signal", self.worker_id);
                self.set_state(WorkerState::Stopping);
                break;
            }

            match self.poll_once().await {
                Ok(true) => {
                    if self.memory_exceeded() {
                        self.set_state(WorkerState::Stopping);
                        break;
                    }
                    self.set_state(WorkerState::Idle);
                }
                Ok(false) => {
                    self.set_state(WorkerState::Idle);
                    self.sleep_or_cancel(&mut cancel, poll_interval).await;
                }
                Err(e) => {
                    tracing::error!("Worker '{}' failed to poll: {}", self.worker_id, e);
                    self.sleep_or_cancel(&mut cancel, poll_interval).await;
                }
            }
        }

        self.set_state(WorkerState::Stopped);
        tracing::info!("Worker '{}' stopped", self.worker_id);
    }

    /// Poll the configured queues once, executing at most one job.
    ///
    /// Returns `Ok(true)` when a job was processed. Public so that embedders
    /// and tests can drive the worker deterministically without the loop.
    pub async fn poll_once(&self) -> AppResult<bool> {
        self.set_state(WorkerState::Polling);
        for queue in &self.queues {
            if let Some(job) = self.queue.pop(queue).await? {
                self.set_state(WorkerState::Executing);
                self.process(job).await;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Execute one job and apply the retry-or-fail decision.
    async fn process(&self, job: Job) {
        tracing::info!(
            "Processing job: id={}, type='{}', attempt={}/{}",
            job.id,
            job.job_type,
            job.attempts + 1,
            job.max_attempts
        );

        match self.executor.execute(&job).await {
            Ok(_) => {
                tracing::info!("Job {} completed successfully", job.id);
            }
            Err(err) => self.handle_failure(job, err).await,
        }
    }

    /// Retry-or-fail decision for a failed job.
    ///
    /// Attempts are incremented before the comparison, so a permanently
    /// failing job with `max_attempts = n` executes exactly n times and the
    /// terminal hook fires exactly once.
    async fn handle_failure(&self, mut job: Job, err: JobExecutionError) {
        tracing::error!(
            "Job failed: id={}, type='{}', attempt={}/{}, error={}",
            job.id,
            job.job_type,
            job.attempts + 1,
            job.max_attempts,
            err
        );

        job.record_failure();

        if err.is_retryable() && !job.retries_exhausted() {
            // Re-enqueue the mutated copy for an immediate retry.
            if let Err(e) = self.queue.push(&job).await {
                tracing::error!("Failed to re-enqueue job {}: {}", job.id, e);
                self.executor.fail(&job, &err).await;
            }
        } else {
            tracing::warn!(
                "Job {} is terminal after {} attempt(s), invoking failure hook",
                job.id,
                job.attempts
            );
            self.executor.fail(&job, &err).await;
        }
    }

    /// Sleep for the poll interval, waking early on a stop request.
    async fn sleep_or_cancel(&self, cancel: &mut watch::Receiver<bool>, interval: Duration) {
        tokio::select! {
            _ = cancel.changed() => {}
            _ = time::sleep(interval) => {}
        }
    }

    /// Check resident memory against the configured ceiling.
    fn memory_exceeded(&self) -> bool {
        let limit_bytes = self.config.memory_limit_mb * 1024 * 1024;
        match resident_memory_bytes() {
            Some(rss) if rss > limit_bytes => {
                tracing::warn!(
                    "Worker '{}' resident memory {}MiB exceeds limit {}MiB, stopping",
                    self.worker_id,
                    rss / (1024 * 1024),
                    self.config.memory_limit_mb
                );
                true
            }
            _ => false,
        }
    }

    fn set_state(&self, state: WorkerState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }
}

/// Resident set size of the current process in bytes.
///
/// Read from `/proc/self/statm` on Linux (page size assumed 4 KiB). Returns
/// `None` on other platforms, which disables the memory guard.
fn resident_memory_bytes() -> Option<u64> {
    #[cfg(target_os = "linux")]
    {
        let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
        let resident_pages: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
        Some(resident_pages * 4096)
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}
