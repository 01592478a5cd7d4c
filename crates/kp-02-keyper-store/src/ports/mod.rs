//! # Store Ports
//!
//! The logical persistence operations of the keyper node, one trait per
//! concern. [`crate::MemoryKeyperStore`] implements all of them; a SQL
//! backend would map each trait onto its schema.

use async_trait::async_trait;
use shared_types::{Eon, EonPublicKey, Hash, KeyperSet};

use crate::domain::{
    CurrentDecryptionTrigger, SlotDecryptionSignature, StoreError, StoredTransaction,
    SubmittedTransaction, SyncedUntil, TxPointer, ValidatorRegistration,
};

/// The `TransactionSubmitted` event stream.
#[async_trait]
pub trait TransactionSubmittedStore: Send + Sync {
    /// Insert an event, assigning it the next per-eon index. Returns the
    /// assigned index.
    async fn insert_event(&self, tx: SubmittedTransaction) -> Result<u64, StoreError>;

    /// Delete all events of the block with the given hash, returning how
    /// many were removed. Used when a Remove segment is applied.
    async fn delete_events_from_block_hash(&self, hash: &Hash) -> Result<u64, StoreError>;

    /// Events of an eon from `from_index` on, ordered by index ascending,
    /// at most `limit`.
    async fn events_from_index(
        &self,
        eon: u64,
        from_index: u64,
        limit: u64,
    ) -> Result<Vec<StoredTransaction>, StoreError>;

    /// Number of stored events for an eon.
    async fn event_count(&self, eon: u64) -> Result<u64, StoreError>;

    /// The sync cursor, absent before the first applied block.
    async fn synced_until(&self) -> Result<Option<SyncedUntil>, StoreError>;

    /// Overwrite the sync cursor.
    async fn set_synced_until(&self, cursor: SyncedUntil) -> Result<(), StoreError>;

    /// Apply one chain update atomically: delete the events of the removed
    /// blocks, insert the new events in order, and advance the cursor. All
    /// or nothing.
    async fn apply_block_update(
        &self,
        removed_block_hashes: &[Hash],
        events: Vec<SubmittedTransaction>,
        synced_until: SyncedUntil,
    ) -> Result<(), StoreError>;
}

/// Per-eon tx pointers.
#[async_trait]
pub trait TxPointerStore: Send + Sync {
    /// The pointer for an eon, if one was ever written.
    async fn tx_pointer(&self, eon: u64) -> Result<Option<TxPointer>, StoreError>;

    /// Overwrite the pointer for its eon.
    async fn set_tx_pointer(&self, pointer: TxPointer) -> Result<(), StoreError>;
}

/// The per-eon current decryption trigger, overwritten each slot.
#[async_trait]
pub trait DecryptionTriggerStore: Send + Sync {
    /// Record the trigger for its eon.
    async fn set_current_trigger(
        &self,
        trigger: CurrentDecryptionTrigger,
    ) -> Result<(), StoreError>;

    /// The most recent trigger for an eon.
    async fn current_trigger(
        &self,
        eon: u64,
    ) -> Result<Option<CurrentDecryptionTrigger>, StoreError>;
}

/// Accumulated slot decryption signatures.
#[async_trait]
pub trait SlotSignatureStore: Send + Sync {
    /// Insert a signature, overwriting any previous row for the same
    /// `(eon, slot, keyper_index)`.
    async fn insert_slot_signature(
        &self,
        signature: SlotDecryptionSignature,
    ) -> Result<(), StoreError>;

    /// Up to `limit` signatures matching the given slot attestation
    /// content, ordered by keyper index ascending.
    async fn slot_signatures(
        &self,
        eon: u64,
        slot: u64,
        tx_pointer: u64,
        identities_hash: &Hash,
        limit: u64,
    ) -> Result<Vec<SlotDecryptionSignature>, StoreError>;
}

/// Keyper sets, insert-only.
#[async_trait]
pub trait KeyperSetStore: Send + Sync {
    /// Insert a set; a duplicate configuration index is ignored so that
    /// redelivered events stay idempotent.
    async fn insert_keyper_set(&self, set: KeyperSet) -> Result<(), StoreError>;

    /// Set with the given configuration index.
    async fn keyper_set_by_index(&self, index: u64) -> Result<Option<KeyperSet>, StoreError>;

    /// The set active at the given block: the one with the highest
    /// activation block not above it.
    async fn keyper_set_for_block(&self, block: u64) -> Result<Option<KeyperSet>, StoreError>;
}

/// Eons, their DKG state and broadcast public keys.
#[async_trait]
pub trait EonStore: Send + Sync {
    /// Insert an eon; duplicates are ignored.
    async fn insert_eon(&self, eon: Eon) -> Result<(), StoreError>;

    /// The eon active at the given block.
    async fn eon_for_block(&self, block: u64) -> Result<Option<Eon>, StoreError>;

    /// All eons, ordered by eon number ascending.
    async fn all_eons(&self) -> Result<Vec<Eon>, StoreError>;

    /// Record that the DKG for an eon produced a result.
    async fn mark_dkg_completed(&self, eon: u64) -> Result<(), StoreError>;

    /// Whether the DKG for an eon has produced a result.
    async fn dkg_completed(&self, eon: u64) -> Result<bool, StoreError>;

    /// Store the broadcast public key of an eon.
    async fn set_eon_key(&self, key: EonPublicKey) -> Result<(), StoreError>;

    /// The broadcast public key of an eon.
    async fn eon_key(&self, eon: u64) -> Result<Option<EonPublicKey>, StoreError>;
}

/// Validator registry entries.
#[async_trait]
pub trait ValidatorRegistryStore: Send + Sync {
    /// The latest stored nonce for a validator.
    async fn latest_nonce(&self, validator_index: u64) -> Result<Option<u64>, StoreError>;

    /// Insert a registration, replacing the validator's previous entry.
    async fn insert_registration(
        &self,
        registration: ValidatorRegistration,
    ) -> Result<(), StoreError>;
}
