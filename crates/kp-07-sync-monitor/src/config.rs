//! # Monitor Configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the sync monitor.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Seconds between cursor samples.
    pub check_interval_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: 30,
        }
    }
}

impl MonitorConfig {
    /// Test configuration with a short interval.
    pub fn for_testing() -> Self {
        Self {
            check_interval_secs: 5,
        }
    }

    /// The check interval as a `Duration`.
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }
}
