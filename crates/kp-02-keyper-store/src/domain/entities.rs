//! # Store Rows
//!
//! The row types persisted by the keyper store. On-chain `u64` values that
//! land here have already passed the signed-64-bit range guard.

use serde::{Deserialize, Serialize};
use shared_types::{Address, Hash};

/// A `TransactionSubmitted` event as it enters the store, before an index
/// is assigned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedTransaction {
    /// Eon the submission belongs to.
    pub eon: u64,
    /// Number of the block containing the event.
    pub block_number: u64,
    /// Hash of the block containing the event; reorg deletion is keyed on
    /// this.
    pub block_hash: Hash,
    /// Transaction index within the block.
    pub tx_index: u64,
    /// Log index within the block.
    pub log_index: u64,
    /// 32-byte identity prefix chosen by the submitter.
    pub identity_prefix: [u8; 32],
    /// Submitting account.
    pub sender: Address,
    /// Declared gas limit of the encrypted transaction.
    pub gas_limit: u64,
}

/// A stored event with its assigned per-eon index.
///
/// Within an eon, indices are contiguous from 0; rows reorged out are
/// always the newest ones, so deletion preserves contiguity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTransaction {
    /// Position in the per-eon queue.
    pub index: u64,
    /// The event payload.
    pub tx: SubmittedTransaction,
}

/// The sync cursor of the `TransactionSubmitted` stream: the latest block
/// whose events are fully reflected in the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncedUntil {
    /// Hash of the latest applied block.
    pub block_hash: Hash,
    /// Number of the latest applied block.
    pub block_number: u64,
    /// Slot containing the latest applied block.
    pub slot: u64,
}

/// Per-eon pointer to the next event index to decrypt. `block` is the
/// synced block at the time of the last advance; the pointer's age is
/// derived as `current_block - block`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxPointer {
    /// Eon the pointer belongs to.
    pub eon: u64,
    /// Next event index to decrypt.
    pub value: u64,
    /// Synced block number at the last advance.
    pub block: u64,
}

/// The decryption trigger most recently produced for an eon, overwritten
/// per slot. The middleware checks outgoing shares against this record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentDecryptionTrigger {
    /// Eon the trigger belongs to.
    pub eon: u64,
    /// Slot the trigger was produced for.
    pub slot: u64,
    /// Tx pointer the identity selection started from.
    pub tx_pointer: u64,
    /// keccak256 over the concatenated ordered identity preimages.
    pub identities_hash: Hash,
}

/// A keyper's attestation of the identities it released a key for in a
/// slot. Threshold-many of these constitute the slot attestation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDecryptionSignature {
    /// Eon of the attestation.
    pub eon: u64,
    /// Attested slot.
    pub slot: u64,
    /// Index of the signing keyper within the set.
    pub keyper_index: u64,
    /// Tx pointer the attestation covers.
    pub tx_pointer: u64,
    /// Identities hash the attestation covers.
    pub identities_hash: Hash,
    /// 65-byte recoverable ECDSA signature.
    pub signature: Vec<u8>,
}

/// A validator registry entry; the per-validator nonce is monotonic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorRegistration {
    /// Validator index on the beacon chain.
    pub validator_index: u64,
    /// Registration nonce; must strictly increase per validator.
    pub nonce: u64,
    /// Whether this is a registration or a deregistration.
    pub is_registration: bool,
    /// Block the registry update was observed in.
    pub block_number: u64,
}
