//! # Messaging Configuration

use serde::{Deserialize, Serialize};

/// Configuration for the messaging middleware.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MessagingConfig {
    /// Protocol instance identifier; messages from other instances are
    /// rejected.
    pub instance_id: u64,
    /// Upper bound on keys per `DecryptionKeys` message.
    pub max_num_keys_per_message: u64,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            instance_id: 0,
            max_num_keys_per_message: 128,
        }
    }
}

impl MessagingConfig {
    /// Test configuration with a small per-message key bound.
    pub fn for_testing() -> Self {
        Self {
            instance_id: 42,
            max_num_keys_per_message: 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        assert!(MessagingConfig::default().max_num_keys_per_message > 0);
    }
}
