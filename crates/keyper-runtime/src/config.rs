//! # Keyper Configuration
//!
//! One aggregate configuration for the whole node, projected onto the
//! per-subsystem configs at wiring time so each crate keeps its own
//! `Config` type.

use kp_01_chain_follower::FollowerConfig;
use kp_03_sequencer_sync::SequencerSyncConfig;
use kp_04_slot_scheduler::SchedulerConfig;
use kp_06_messaging::MessagingConfig;
use kp_07_sync_monitor::MonitorConfig;
use kp_08_eon_key_publisher::PublisherConfig;
use serde::{Deserialize, Serialize};
use shared_types::{Address, SlotTiming};

/// Configuration for a keyper node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyperConfig {
    /// Protocol instance identifier shared by all keypers of a deployment.
    pub instance_id: u64,
    /// Chain id expected in validator registration messages.
    pub chain_id: u64,
    /// This node's keyper address.
    pub own_address: Address,
    /// Sequencer contract emitting `TransactionSubmitted`.
    pub sequencer_address: Address,
    /// Keyper-set manager contract emitting `KeyperSetAdded`.
    pub keyper_set_manager_address: Address,
    /// Key-broadcast contract emitting `EonKeyBroadcast`.
    pub key_broadcast_address: Address,
    /// Validator registry contract emitting `Updated`.
    pub validator_registry_address: Address,
    /// Slot timing of the beacon chain the sequencer follows.
    pub slot_timing: SlotTiming,
    /// Gas budget for the encrypted portion of a block.
    pub encrypted_gas_limit: u64,
    /// Lower bound on a single encrypted transaction's gas.
    pub min_gas_per_transaction: u64,
    /// Tx pointer ages beyond this trigger recovery to the queue tail.
    pub max_tx_pointer_age: u64,
    /// Upper bound on keys per `DecryptionKeys` message.
    pub max_num_keys_per_message: u64,
    /// Headers retained in the chain cache.
    pub max_cache_size: usize,
    /// Seconds between sync monitor samples.
    pub monitor_check_interval_secs: u64,
    /// Seconds between eon key publish retries.
    pub publisher_retry_interval_secs: u64,
    /// Capacity of the decryption trigger channel handed to the core.
    pub trigger_channel_capacity: usize,
}

impl Default for KeyperConfig {
    fn default() -> Self {
        Self {
            instance_id: 0,
            chain_id: 1,
            own_address: [0; 20],
            sequencer_address: [0; 20],
            keyper_set_manager_address: [0; 20],
            key_broadcast_address: [0; 20],
            validator_registry_address: [0; 20],
            slot_timing: SlotTiming {
                genesis_slot_timestamp: 0,
                seconds_per_slot: 5,
            },
            encrypted_gas_limit: 1_000_000,
            min_gas_per_transaction: 21_000,
            max_tx_pointer_age: 10,
            max_num_keys_per_message: 128,
            max_cache_size: 100,
            monitor_check_interval_secs: 30,
            publisher_retry_interval_secs: 12,
            trigger_channel_capacity: 16,
        }
    }
}

impl KeyperConfig {
    /// Test configuration aligned with the per-crate test configs: test
    /// slot timing (genesis 1000, five-second slots), the sequencer at
    /// `[0x5E; 20]` and this node at `[0xAA; 20]`.
    pub fn for_testing() -> Self {
        Self {
            instance_id: 42,
            chain_id: 1337,
            own_address: [0xAA; 20],
            sequencer_address: [0x5E; 20],
            keyper_set_manager_address: [0x4B; 20],
            key_broadcast_address: [0xEB; 20],
            validator_registry_address: [0x7E; 20],
            slot_timing: SlotTiming {
                genesis_slot_timestamp: 1000,
                seconds_per_slot: 5,
            },
            encrypted_gas_limit: 100_000,
            min_gas_per_transaction: 21_000,
            max_tx_pointer_age: 10,
            max_num_keys_per_message: 8,
            max_cache_size: 10,
            monitor_check_interval_secs: 5,
            publisher_retry_interval_secs: 12,
            trigger_channel_capacity: 4,
        }
    }

    /// The chain follower's view of this configuration.
    pub fn follower(&self) -> FollowerConfig {
        FollowerConfig {
            max_cache_size: self.max_cache_size,
        }
    }

    /// The sequencer sync handler's view of this configuration.
    pub fn sequencer_sync(&self) -> SequencerSyncConfig {
        SequencerSyncConfig {
            sequencer_address: self.sequencer_address,
            slot_timing: self.slot_timing,
        }
    }

    /// The slot scheduler's view of this configuration.
    pub fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig {
            own_address: self.own_address,
            encrypted_gas_limit: self.encrypted_gas_limit,
            min_gas_per_transaction: self.min_gas_per_transaction,
            max_tx_pointer_age: self.max_tx_pointer_age,
            slot_timing: self.slot_timing,
        }
    }

    /// The messaging middleware's view of this configuration.
    pub fn messaging(&self) -> MessagingConfig {
        MessagingConfig {
            instance_id: self.instance_id,
            max_num_keys_per_message: self.max_num_keys_per_message,
        }
    }

    /// The sync monitor's view of this configuration.
    pub fn monitor(&self) -> MonitorConfig {
        MonitorConfig {
            check_interval_secs: self.monitor_check_interval_secs,
        }
    }

    /// The eon key publisher's view of this configuration.
    pub fn publisher(&self) -> PublisherConfig {
        PublisherConfig {
            own_address: self.own_address,
            retry_interval_secs: self.publisher_retry_interval_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = KeyperConfig::default();
        assert!(config.min_gas_per_transaction > 0);
        assert!(config.trigger_channel_capacity > 0);
    }

    #[test]
    fn test_subsystem_views_share_fields() {
        let config = KeyperConfig::for_testing();
        assert_eq!(config.scheduler().own_address, config.own_address);
        assert_eq!(config.publisher().own_address, config.own_address);
        assert_eq!(
            config.sequencer_sync().slot_timing.seconds_per_slot,
            config.slot_timing.seconds_per_slot
        );
        assert_eq!(config.messaging().instance_id, config.instance_id);
    }
}
