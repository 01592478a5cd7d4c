//! # Publisher Configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};
use shared_types::Address;

/// Configuration for the eon key publisher.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// This node's keyper address.
    pub own_address: Address,
    /// Seconds between publish attempts after a transient failure.
    pub retry_interval_secs: u64,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            own_address: [0; 20],
            retry_interval_secs: 12,
        }
    }
}

impl PublisherConfig {
    /// Test configuration.
    pub fn for_testing() -> Self {
        Self {
            own_address: [0xAA; 20],
            retry_interval_secs: 12,
        }
    }

    /// The retry interval as a `Duration`.
    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }
}
