//! Queue backend configuration.

use serde::{Deserialize, Serialize};

/// Queue backend selection and defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Backend implementation: `"memory"` is the built-in reference backend.
    /// Durable backends are provided by the embedding application.
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Queue name used when a job does not specify one.
    #[serde(default = "default_queue_name")]
    pub default_queue: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            default_queue: default_queue_name(),
        }
    }
}

fn default_backend() -> String {
    "memory".to_string()
}

fn default_queue_name() -> String {
    "default".to_string()
}
