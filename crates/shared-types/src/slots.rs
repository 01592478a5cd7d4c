//! # Slot Arithmetic
//!
//! Conversions between wall-clock / block timestamps and beacon slots.

use serde::{Deserialize, Serialize};

/// Slot timing parameters: genesis timestamp and slot duration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotTiming {
    /// Unix timestamp (seconds) of the start of slot 0.
    pub genesis_slot_timestamp: u64,
    /// Seconds per slot.
    pub seconds_per_slot: u64,
}

impl SlotTiming {
    /// Slot containing the given block timestamp. Timestamps before genesis
    /// map to slot 0.
    pub fn slot_for_timestamp(&self, timestamp: u64) -> u64 {
        if timestamp < self.genesis_slot_timestamp {
            return 0;
        }
        (timestamp - self.genesis_slot_timestamp) / self.seconds_per_slot
    }

    /// Unix timestamp of the start of the given slot.
    pub fn slot_start_timestamp(&self, slot: u64) -> u64 {
        self.genesis_slot_timestamp + slot * self.seconds_per_slot
    }
}
