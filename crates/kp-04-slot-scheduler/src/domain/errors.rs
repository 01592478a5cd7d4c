//! # Scheduler Errors

use kp_02_keyper_store::StoreError;
use thiserror::Error;

/// Why a slot did not produce a trigger.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// No block has been synced yet; nothing to schedule against.
    #[error("No synced block yet")]
    NotSynced,

    /// A block for this slot (or a later one) was already observed, so the
    /// proposer was early or our clock is late.
    #[error("Slot {slot} already processed, synced until slot {synced_slot}")]
    SlotAlreadyProcessed {
        /// Slot the ticker delivered.
        slot: u64,
        /// Slot of the latest synced block.
        synced_slot: u64,
    },

    /// No keyper set is active at the synced block.
    #[error("No keyper set active at block {0}")]
    NoKeyperSetForBlock(u64),

    /// This node is not a member of the active keyper set.
    #[error("Not a member of the active keyper set")]
    NotInKeyperSet,

    /// No eon is active at the synced block.
    #[error("No eon active at block {0}")]
    NoEonForBlock(u64),

    /// An inbound decryption-keys message already advanced the pointer at
    /// this block; our shares would be redundant.
    #[error("Tx pointer already advanced at the synced block")]
    TxPointerAgeZero,

    /// The store failed; the slot is aborted and the next one retries.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SchedulerError {
    /// Whether this is an expected per-slot skip rather than a failure.
    pub fn is_skip(&self) -> bool {
        !matches!(self, SchedulerError::Store(_))
    }
}
