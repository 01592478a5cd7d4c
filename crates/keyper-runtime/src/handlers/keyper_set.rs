//! # Keyper Set Handler
//!
//! Contract-event handler for `KeyperSetAdded`. Resolves the announced set
//! contract at the emitting block, rejects sets that are not finalized and
//! records the set together with its eon. Inserts are append-only and are
//! deliberately not rolled back on reorgs; a redelivered or replayed event
//! is a no-op because duplicate configuration indices are ignored.

use std::sync::Arc;

use async_trait::async_trait;
use kp_01_chain_follower::{
    ChainFollowerError, ChainUpdate, ContractEvent, ContractEventHandler, KeyperSetAddedEvent,
};
use kp_02_keyper_store::{EonStore, KeyperSetStore};
use shared_types::{Address, Eon, Hash, Header, KeyperSet, Log};
use tokio::sync::mpsc;

use crate::errors::RuntimeError;
use crate::ports::KeyperSetContract;

/// Store surface of the keyper set handler.
pub trait KeyperSetEonStore: KeyperSetStore + EonStore {}
impl<T> KeyperSetEonStore for T where T: KeyperSetStore + EonStore {}

/// Ingests `KeyperSetAdded` events into the store and notifies the
/// key-generation core of each new set.
pub struct KeyperSetAddedHandler {
    manager_address: Address,
    contract: Arc<dyn KeyperSetContract>,
    store: Arc<dyn KeyperSetEonStore>,
    new_sets: mpsc::UnboundedSender<KeyperSet>,
}

impl KeyperSetAddedHandler {
    /// A handler resolving sets through `contract` and writing into `store`.
    pub fn new(
        manager_address: Address,
        contract: Arc<dyn KeyperSetContract>,
        store: Arc<dyn KeyperSetEonStore>,
        new_sets: mpsc::UnboundedSender<KeyperSet>,
    ) -> Self {
        Self {
            manager_address,
            contract,
            store,
            new_sets,
        }
    }
}

#[async_trait]
impl ContractEventHandler for KeyperSetAddedHandler {
    fn address(&self) -> Address {
        self.manager_address
    }

    fn topic(&self) -> Hash {
        KeyperSetAddedEvent::topic()
    }

    fn parse(&self, log: &Log) -> Result<ContractEvent, ChainFollowerError> {
        Ok(ContractEvent::KeyperSetAdded(KeyperSetAddedEvent::decode(
            log,
        )?))
    }

    async fn accept(
        &self,
        _header: &Header,
        event: &ContractEvent,
    ) -> Result<bool, ChainFollowerError> {
        Ok(matches!(event, ContractEvent::KeyperSetAdded(_)))
    }

    async fn handle(
        &self,
        _update: &ChainUpdate,
        events: &[ContractEvent],
    ) -> Result<(), ChainFollowerError> {
        for event in events {
            let ContractEvent::KeyperSetAdded(event) = event else {
                continue;
            };
            let data = self
                .contract
                .keyper_set(event.keyper_set_contract, event.block_hash)
                .await?;
            if !data.is_finalized {
                tracing::warn!(
                    index = data.index,
                    activation_block = event.activation_block_number,
                    "Ignoring keyper set that is not finalized"
                );
                continue;
            }

            let set = KeyperSet {
                keyper_config_index: data.index,
                activation_block_number: event.activation_block_number,
                members: data.members,
                threshold: data.threshold,
            };
            self.store
                .insert_keyper_set(set.clone())
                .await
                .map_err(RuntimeError::from)?;
            self.store
                .insert_eon(Eon {
                    eon: data.index,
                    activation_block_number: event.activation_block_number,
                })
                .await
                .map_err(RuntimeError::from)?;
            tracing::info!(
                index = set.keyper_config_index,
                activation_block = set.activation_block_number,
                members = set.members.len(),
                threshold = set.threshold,
                "Added keyper set"
            );
            // The core may have shut down already; the store row is what
            // matters.
            let _ = self.new_sets.send(set);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{KeyperSetData, MockKeyperSetContract};
    use kp_01_chain_follower::testing::{header_chain, test_hash};
    use kp_01_chain_follower::ChainSegment;
    use kp_02_keyper_store::MemoryKeyperStore;

    const SET_CONTRACT: Address = [0x77; 20];

    fn handler() -> (
        KeyperSetAddedHandler,
        Arc<MockKeyperSetContract>,
        Arc<MemoryKeyperStore>,
        mpsc::UnboundedReceiver<KeyperSet>,
    ) {
        let contract = Arc::new(MockKeyperSetContract::new());
        let store = Arc::new(MemoryKeyperStore::new());
        let (tx, rx) = mpsc::unbounded_channel();
        let handler = KeyperSetAddedHandler::new([0x4B; 20], contract.clone(), store.clone(), tx);
        (handler, contract, store, rx)
    }

    fn set_data(finalized: bool) -> KeyperSetData {
        KeyperSetData {
            index: 1,
            members: vec![[0xAA; 20], [0xBB; 20], [0xCC; 20]],
            threshold: 2,
            is_finalized: finalized,
        }
    }

    fn added_event() -> ContractEvent {
        ContractEvent::KeyperSetAdded(KeyperSetAddedEvent {
            activation_block_number: 100,
            keyper_set_contract: SET_CONTRACT,
            block_hash: test_hash(0, 12),
            block_number: 12,
        })
    }

    fn update() -> ChainUpdate {
        ChainUpdate {
            remove: None,
            append: ChainSegment::new(header_chain(0, 12, 1)).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_finalized_set_is_stored_with_its_eon() {
        let (handler, contract, store, mut rx) = handler();
        contract.register(SET_CONTRACT, set_data(true));

        handler.handle(&update(), &[added_event()]).await.unwrap();

        let set = store.keyper_set_by_index(1).await.unwrap().unwrap();
        assert_eq!(set.activation_block_number, 100);
        assert_eq!(set.members.len(), 3);
        assert_eq!(set.threshold, 2);
        let eon = store.eon_for_block(100).await.unwrap().unwrap();
        assert_eq!(eon.eon, 1);

        let notified = rx.try_recv().unwrap();
        assert_eq!(notified.keyper_config_index, 1);
    }

    #[tokio::test]
    async fn test_non_finalized_set_is_ignored() {
        let (handler, contract, store, mut rx) = handler();
        contract.register(SET_CONTRACT, set_data(false));

        handler.handle(&update(), &[added_event()]).await.unwrap();

        assert!(store.keyper_set_by_index(1).await.unwrap().is_none());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_redelivered_event_is_idempotent() {
        let (handler, contract, store, _rx) = handler();
        contract.register(SET_CONTRACT, set_data(true));

        handler.handle(&update(), &[added_event()]).await.unwrap();
        handler.handle(&update(), &[added_event()]).await.unwrap();

        assert_eq!(store.all_eons().await.unwrap().len(), 1);
        let set = store.keyper_set_by_index(1).await.unwrap().unwrap();
        assert_eq!(set.members.len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_set_contract_fails_the_update() {
        let (handler, _contract, store, _rx) = handler();
        // Nothing registered: the read fails and the update is redelivered.
        let result = handler.handle(&update(), &[added_event()]).await;
        assert!(matches!(result, Err(ChainFollowerError::Handler(_))));
        assert!(store.keyper_set_by_index(1).await.unwrap().is_none());
    }
}
