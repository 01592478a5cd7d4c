//! # Chain Follower Configuration

use serde::{Deserialize, Serialize};

/// Configuration for the chain follower.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FollowerConfig {
    /// Headers retained in the chain cache; bounds how deep a reorg can be
    /// absorbed.
    pub max_cache_size: usize,
}

impl Default for FollowerConfig {
    fn default() -> Self {
        Self { max_cache_size: 100 }
    }
}

impl FollowerConfig {
    /// Create a config for testing (smaller values).
    pub fn for_testing() -> Self {
        Self { max_cache_size: 10 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        assert_eq!(FollowerConfig::default().max_cache_size, 100);
    }

    #[test]
    fn test_testing_config() {
        assert_eq!(FollowerConfig::for_testing().max_cache_size, 10);
    }
}
