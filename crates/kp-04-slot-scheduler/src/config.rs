//! # Scheduler Configuration

use serde::{Deserialize, Serialize};
use shared_types::{Address, SlotTiming};

/// Configuration for the slot scheduler.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// This node's keyper address, for set membership checks.
    pub own_address: Address,
    /// Total gas budget for the encrypted portion of a block.
    pub encrypted_gas_limit: u64,
    /// Lower bound on a single encrypted transaction's gas, used to bound
    /// how many queue entries one slot can consume. Must be non-zero.
    pub min_gas_per_transaction: u64,
    /// Pointer ages beyond this trigger recovery to the queue tail.
    pub max_tx_pointer_age: u64,
    /// Slot timing shared with the ticker.
    pub slot_timing: SlotTiming,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            own_address: [0; 20],
            encrypted_gas_limit: 1_000_000,
            min_gas_per_transaction: 21_000,
            max_tx_pointer_age: 10,
            slot_timing: SlotTiming {
                genesis_slot_timestamp: 0,
                seconds_per_slot: 5,
            },
        }
    }
}

impl SchedulerConfig {
    /// Test configuration with a small gas budget and the test slot timing
    /// (genesis 1000, five-second slots).
    pub fn for_testing() -> Self {
        Self {
            own_address: [0xAA; 20],
            encrypted_gas_limit: 100_000,
            min_gas_per_transaction: 21_000,
            max_tx_pointer_age: 10,
            slot_timing: SlotTiming {
                genesis_slot_timestamp: 1000,
                seconds_per_slot: 5,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchedulerConfig::default();
        assert!(config.min_gas_per_transaction > 0);
        assert!(config.encrypted_gas_limit >= config.min_gas_per_transaction);
    }
}
