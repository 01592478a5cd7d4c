//! # In-Memory Keyper Store
//!
//! All store traits behind a single mutex; every multi-row operation holds
//! the lock for its whole duration, which gives the same all-or-nothing
//! visibility a transactional backend provides.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{Eon, EonPublicKey, Hash, KeyperSet};

use crate::domain::{
    CurrentDecryptionTrigger, SlotDecryptionSignature, StoreError, StoredTransaction,
    SubmittedTransaction, SyncedUntil, TxPointer, ValidatorRegistration,
};
use crate::ports::{
    DecryptionTriggerStore, EonStore, KeyperSetStore, SlotSignatureStore,
    TransactionSubmittedStore, TxPointerStore, ValidatorRegistryStore,
};

#[derive(Default)]
struct StoreState {
    events: Vec<StoredTransaction>,
    synced_until: Option<SyncedUntil>,
    tx_pointers: HashMap<u64, TxPointer>,
    triggers: HashMap<u64, CurrentDecryptionTrigger>,
    // keyed by (eon, slot, keyper_index)
    signatures: BTreeMap<(u64, u64, u64), SlotDecryptionSignature>,
    keyper_sets: Vec<KeyperSet>,
    eons: Vec<Eon>,
    dkg_completed: HashSet<u64>,
    eon_keys: HashMap<u64, EonPublicKey>,
    registrations: HashMap<u64, ValidatorRegistration>,
}

impl StoreState {
    fn event_count(&self, eon: u64) -> u64 {
        self.events.iter().filter(|e| e.tx.eon == eon).count() as u64
    }

    fn insert_event(&mut self, tx: SubmittedTransaction) -> u64 {
        let index = self.event_count(tx.eon);
        self.events.push(StoredTransaction { index, tx });
        index
    }
}

/// In-memory implementation of every store port.
#[derive(Default)]
pub struct MemoryKeyperStore {
    state: Mutex<StoreState>,
}

impl MemoryKeyperStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionSubmittedStore for MemoryKeyperStore {
    async fn insert_event(&self, tx: SubmittedTransaction) -> Result<u64, StoreError> {
        Ok(self.state.lock().insert_event(tx))
    }

    async fn delete_events_from_block_hash(&self, hash: &Hash) -> Result<u64, StoreError> {
        let mut state = self.state.lock();
        let before = state.events.len();
        state.events.retain(|e| &e.tx.block_hash != hash);
        Ok((before - state.events.len()) as u64)
    }

    async fn events_from_index(
        &self,
        eon: u64,
        from_index: u64,
        limit: u64,
    ) -> Result<Vec<StoredTransaction>, StoreError> {
        let state = self.state.lock();
        let mut events: Vec<StoredTransaction> = state
            .events
            .iter()
            .filter(|e| e.tx.eon == eon && e.index >= from_index)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.index);
        events.truncate(limit as usize);
        Ok(events)
    }

    async fn event_count(&self, eon: u64) -> Result<u64, StoreError> {
        Ok(self.state.lock().event_count(eon))
    }

    async fn synced_until(&self) -> Result<Option<SyncedUntil>, StoreError> {
        Ok(self.state.lock().synced_until)
    }

    async fn set_synced_until(&self, cursor: SyncedUntil) -> Result<(), StoreError> {
        self.state.lock().synced_until = Some(cursor);
        Ok(())
    }

    async fn apply_block_update(
        &self,
        removed_block_hashes: &[Hash],
        events: Vec<SubmittedTransaction>,
        synced_until: SyncedUntil,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        state
            .events
            .retain(|e| !removed_block_hashes.contains(&e.tx.block_hash));
        for event in events {
            state.insert_event(event);
        }
        state.synced_until = Some(synced_until);
        Ok(())
    }
}

#[async_trait]
impl TxPointerStore for MemoryKeyperStore {
    async fn tx_pointer(&self, eon: u64) -> Result<Option<TxPointer>, StoreError> {
        Ok(self.state.lock().tx_pointers.get(&eon).copied())
    }

    async fn set_tx_pointer(&self, pointer: TxPointer) -> Result<(), StoreError> {
        self.state.lock().tx_pointers.insert(pointer.eon, pointer);
        Ok(())
    }
}

#[async_trait]
impl DecryptionTriggerStore for MemoryKeyperStore {
    async fn set_current_trigger(
        &self,
        trigger: CurrentDecryptionTrigger,
    ) -> Result<(), StoreError> {
        self.state.lock().triggers.insert(trigger.eon, trigger);
        Ok(())
    }

    async fn current_trigger(
        &self,
        eon: u64,
    ) -> Result<Option<CurrentDecryptionTrigger>, StoreError> {
        Ok(self.state.lock().triggers.get(&eon).copied())
    }
}

#[async_trait]
impl SlotSignatureStore for MemoryKeyperStore {
    async fn insert_slot_signature(
        &self,
        signature: SlotDecryptionSignature,
    ) -> Result<(), StoreError> {
        self.state.lock().signatures.insert(
            (signature.eon, signature.slot, signature.keyper_index),
            signature,
        );
        Ok(())
    }

    async fn slot_signatures(
        &self,
        eon: u64,
        slot: u64,
        tx_pointer: u64,
        identities_hash: &Hash,
        limit: u64,
    ) -> Result<Vec<SlotDecryptionSignature>, StoreError> {
        let state = self.state.lock();
        // BTreeMap iteration order makes this ascending by keyper index.
        let signatures = state
            .signatures
            .range((eon, slot, 0)..=(eon, slot, u64::MAX))
            .map(|(_, s)| s)
            .filter(|s| s.tx_pointer == tx_pointer && &s.identities_hash == identities_hash)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok(signatures)
    }
}

#[async_trait]
impl KeyperSetStore for MemoryKeyperStore {
    async fn insert_keyper_set(&self, set: KeyperSet) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        if state
            .keyper_sets
            .iter()
            .any(|s| s.keyper_config_index == set.keyper_config_index)
        {
            return Ok(());
        }
        state.keyper_sets.push(set);
        Ok(())
    }

    async fn keyper_set_by_index(&self, index: u64) -> Result<Option<KeyperSet>, StoreError> {
        Ok(self
            .state
            .lock()
            .keyper_sets
            .iter()
            .find(|s| s.keyper_config_index == index)
            .cloned())
    }

    async fn keyper_set_for_block(&self, block: u64) -> Result<Option<KeyperSet>, StoreError> {
        Ok(self
            .state
            .lock()
            .keyper_sets
            .iter()
            .filter(|s| s.activation_block_number <= block)
            .max_by_key(|s| s.activation_block_number)
            .cloned())
    }
}

#[async_trait]
impl EonStore for MemoryKeyperStore {
    async fn insert_eon(&self, eon: Eon) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        if state.eons.iter().any(|e| e.eon == eon.eon) {
            return Ok(());
        }
        state.eons.push(eon);
        state.eons.sort_by_key(|e| e.eon);
        Ok(())
    }

    async fn eon_for_block(&self, block: u64) -> Result<Option<Eon>, StoreError> {
        Ok(self
            .state
            .lock()
            .eons
            .iter()
            .filter(|e| e.activation_block_number <= block)
            .max_by_key(|e| e.activation_block_number)
            .cloned())
    }

    async fn all_eons(&self) -> Result<Vec<Eon>, StoreError> {
        Ok(self.state.lock().eons.clone())
    }

    async fn mark_dkg_completed(&self, eon: u64) -> Result<(), StoreError> {
        self.state.lock().dkg_completed.insert(eon);
        Ok(())
    }

    async fn dkg_completed(&self, eon: u64) -> Result<bool, StoreError> {
        Ok(self.state.lock().dkg_completed.contains(&eon))
    }

    async fn set_eon_key(&self, key: EonPublicKey) -> Result<(), StoreError> {
        self.state.lock().eon_keys.insert(key.eon, key);
        Ok(())
    }

    async fn eon_key(&self, eon: u64) -> Result<Option<EonPublicKey>, StoreError> {
        Ok(self.state.lock().eon_keys.get(&eon).cloned())
    }
}

#[async_trait]
impl ValidatorRegistryStore for MemoryKeyperStore {
    async fn latest_nonce(&self, validator_index: u64) -> Result<Option<u64>, StoreError> {
        Ok(self
            .state
            .lock()
            .registrations
            .get(&validator_index)
            .map(|r| r.nonce))
    }

    async fn insert_registration(
        &self,
        registration: ValidatorRegistration,
    ) -> Result<(), StoreError> {
        self.state
            .lock()
            .registrations
            .insert(registration.validator_index, registration);
        Ok(())
    }
}
