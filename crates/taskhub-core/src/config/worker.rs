//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Background job worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the worker is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Queues to poll, in order.
    #[serde(default = "default_queues")]
    pub queues: Vec<String>,
    /// Interval in seconds between job queue polls when the queue is empty.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Resident memory ceiling in MiB. The worker stops gracefully once a
    /// processed job leaves it above this limit.
    #[serde(default = "default_memory_limit")]
    pub memory_limit_mb: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            queues: default_queues(),
            poll_interval_seconds: default_poll_interval(),
            memory_limit_mb: default_memory_limit(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_queues() -> Vec<String> {
    vec!["default".to_string()]
}

fn default_poll_interval() -> u64 {
    3
}

fn default_memory_limit() -> u64 {
    128
}
