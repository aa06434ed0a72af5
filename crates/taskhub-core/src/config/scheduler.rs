//! Scheduled task configuration.

use serde::{Deserialize, Serialize};

/// Scheduled task sweep configuration.
///
/// The scheduler itself does not self-trigger; the daemon runs a sweep loop
/// at this interval. Sweeps are sequential, so a slow task delays the tasks
/// after it within the same sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Whether the scheduler sweep loop is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Interval in seconds between sweeps of the task registry.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_sweep_interval() -> u64 {
    60
}
