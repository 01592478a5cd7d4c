//! # Sequencer Sync Configuration

use serde::{Deserialize, Serialize};
use shared_types::{Address, SlotTiming};

/// Configuration for the sequencer sync handler.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SequencerSyncConfig {
    /// Address of the sequencer contract emitting `TransactionSubmitted`.
    pub sequencer_address: Address,
    /// Slot timing used to derive the slot of each synced block.
    pub slot_timing: SlotTiming,
}

impl Default for SequencerSyncConfig {
    fn default() -> Self {
        Self {
            sequencer_address: [0; 20],
            slot_timing: SlotTiming {
                genesis_slot_timestamp: 0,
                seconds_per_slot: 5,
            },
        }
    }
}

impl SequencerSyncConfig {
    /// Test configuration aligned with the chain follower's test headers,
    /// whose timestamps are `1000 + number * 5`: block number == slot.
    pub fn for_testing() -> Self {
        Self {
            sequencer_address: [0x5E; 20],
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
        let config = SequencerSyncConfig::default();
        assert_eq!(config.slot_timing.seconds_per_slot, 5);
    }
}
