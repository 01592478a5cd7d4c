//! # Sequencer Sync Handler
//!
//! Contract-event handler mirroring the sequencer's `TransactionSubmitted`
//! queue into the keyper store. Each chain update is applied in one atomic
//! store operation: reorged rows deleted, new rows inserted in canonical
//! order, cursor advanced to the Append's latest block.

use std::sync::Arc;

use async_trait::async_trait;
use kp_01_chain_follower::{
    ChainFollowerError, ChainUpdate, ContractEvent, ContractEventHandler,
    TransactionSubmittedEvent,
};
use kp_02_keyper_store::{SubmittedTransaction, SyncedUntil, TransactionSubmittedStore};
use primitive_types::U256;
use shared_types::{fits_i63, Address, Hash, Header, Log, I63_MAX};

use crate::config::SequencerSyncConfig;

/// Ingests `TransactionSubmitted` events into the store.
pub struct SequencerSyncHandler {
    config: SequencerSyncConfig,
    store: Arc<dyn TransactionSubmittedStore>,
}

impl SequencerSyncHandler {
    /// A handler writing into the given store.
    pub fn new(config: SequencerSyncConfig, store: Arc<dyn TransactionSubmittedStore>) -> Self {
        Self { config, store }
    }

    fn to_row(event: &TransactionSubmittedEvent) -> SubmittedTransaction {
        SubmittedTransaction {
            eon: event.eon,
            block_number: event.block_number,
            block_hash: event.block_hash,
            tx_index: event.tx_index,
            log_index: event.log_index,
            identity_prefix: event.identity_prefix,
            sender: event.sender,
            // accept has already bounded this to the signed 64-bit range.
            gas_limit: event.gas_limit.low_u64(),
        }
    }
}

#[async_trait]
impl ContractEventHandler for SequencerSyncHandler {
    fn address(&self) -> Address {
        self.config.sequencer_address
    }

    fn topic(&self) -> Hash {
        TransactionSubmittedEvent::topic()
    }

    fn parse(&self, log: &Log) -> Result<ContractEvent, ChainFollowerError> {
        Ok(ContractEvent::TransactionSubmitted(
            TransactionSubmittedEvent::decode(log)?,
        ))
    }

    async fn accept(
        &self,
        _header: &Header,
        event: &ContractEvent,
    ) -> Result<bool, ChainFollowerError> {
        let ContractEvent::TransactionSubmitted(event) = event else {
            return Ok(false);
        };
        if !fits_i63(event.eon) {
            tracing::warn!(eon = event.eon, "Discarding submission with out-of-range eon");
            return Ok(false);
        }
        if event.gas_limit > U256::from(I63_MAX) {
            tracing::warn!(
                gas_limit = %event.gas_limit,
                "Discarding submission with out-of-range gas limit"
            );
            return Ok(false);
        }
        Ok(true)
    }

    async fn handle(
        &self,
        update: &ChainUpdate,
        events: &[ContractEvent],
    ) -> Result<(), ChainFollowerError> {
        let latest = update.append.latest();
        let cursor = SyncedUntil {
            block_hash: latest.hash,
            block_number: latest.number,
            slot: self.config.slot_timing.slot_for_timestamp(latest.timestamp),
        };

        // An update may be re-delivered when a sibling handler failed after
        // our rows were committed. The cursor tells those apart.
        let synced = self
            .store
            .synced_until()
            .await
            .map_err(|e| ChainFollowerError::Handler(e.to_string()))?;
        if synced.map(|s| s.block_hash) == Some(cursor.block_hash) {
            tracing::debug!(
                block = cursor.block_number,
                "Update already applied, skipping"
            );
            return Ok(());
        }

        let removed: Vec<Hash> = update
            .remove
            .iter()
            .flat_map(|segment| segment.headers().iter().map(|h| h.hash))
            .collect();
        let rows: Vec<SubmittedTransaction> = events
            .iter()
            .filter_map(|event| match event {
                ContractEvent::TransactionSubmitted(event) => Some(Self::to_row(event)),
                _ => None,
            })
            .collect();

        tracing::debug!(
            removed_blocks = removed.len(),
            inserted = rows.len(),
            block = cursor.block_number,
            slot = cursor.slot,
            "Applying sequencer update"
        );
        self.store
            .apply_block_update(&removed, rows, cursor)
            .await
            .map_err(|e| ChainFollowerError::Handler(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kp_01_chain_follower::testing::header_chain;
    use kp_01_chain_follower::ChainSegment;
    use kp_02_keyper_store::MemoryKeyperStore;

    fn handler_with_store() -> (SequencerSyncHandler, Arc<MemoryKeyperStore>) {
        let store = Arc::new(MemoryKeyperStore::new());
        let handler = SequencerSyncHandler::new(SequencerSyncConfig::for_testing(), store.clone());
        (handler, store)
    }

    fn submission(eon: u64, header: &shared_types::Header, log_index: u64) -> ContractEvent {
        ContractEvent::TransactionSubmitted(TransactionSubmittedEvent {
            eon,
            identity_prefix: [log_index as u8; 32],
            sender: [0xCD; 20],
            encrypted_transaction: vec![1, 2, 3],
            gas_limit: U256::from(50_000u64),
            block_hash: header.hash,
            block_number: header.number,
            tx_index: 0,
            log_index,
        })
    }

    fn append_update(headers: Vec<shared_types::Header>) -> ChainUpdate {
        ChainUpdate {
            remove: None,
            append: ChainSegment::new(headers).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_handle_inserts_rows_and_advances_cursor() {
        let (handler, store) = handler_with_store();
        let chain = header_chain(0, 10, 2);
        let events = vec![submission(1, &chain[0], 0), submission(1, &chain[1], 1)];

        handler
            .handle(&append_update(chain.clone()), &events)
            .await
            .unwrap();

        assert_eq!(store.event_count(1).await.unwrap(), 2);
        let cursor = store.synced_until().await.unwrap().unwrap();
        assert_eq!(cursor.block_number, 11);
        assert_eq!(cursor.block_hash, chain[1].hash);
        // Test headers carry timestamp 1000 + number * 5, so slot == number.
        assert_eq!(cursor.slot, 11);
    }

    #[tokio::test]
    async fn test_reorg_deletes_replaced_rows() {
        let (handler, store) = handler_with_store();
        let chain = header_chain(0, 10, 3);
        handler
            .handle(
                &append_update(chain.clone()),
                &[submission(1, &chain[1], 0), submission(1, &chain[2], 1)],
            )
            .await
            .unwrap();

        // Blocks 11-12 reorg away; the branch has one submission in 11'.
        let fork = kp_01_chain_follower::testing::fork_chain(&chain[0], 1, 2);
        let update = ChainUpdate {
            remove: Some(ChainSegment::new(chain[1..].to_vec()).unwrap()),
            append: ChainSegment::new(fork.clone()).unwrap(),
        };
        handler
            .handle(&update, &[submission(1, &fork[0], 0)])
            .await
            .unwrap();

        assert_eq!(store.event_count(1).await.unwrap(), 1);
        let rows = store.events_from_index(1, 0, 10).await.unwrap();
        assert_eq!(rows[0].index, 0);
        assert_eq!(rows[0].tx.block_hash, fork[0].hash);
        let cursor = store.synced_until().await.unwrap().unwrap();
        assert_eq!(cursor.block_hash, fork[1].hash);
    }

    #[tokio::test]
    async fn test_redelivered_update_is_idempotent() {
        let (handler, store) = handler_with_store();
        let chain = header_chain(0, 10, 1);
        let update = append_update(chain.clone());
        let events = vec![submission(1, &chain[0], 0)];

        handler.handle(&update, &events).await.unwrap();
        handler.handle(&update, &events).await.unwrap();

        assert_eq!(store.event_count(1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_accept_discards_out_of_range_values() {
        let (handler, _) = handler_with_store();
        let chain = header_chain(0, 10, 1);

        let ok = submission(1, &chain[0], 0);
        assert!(handler.accept(&chain[0], &ok).await.unwrap());

        let bad_eon = submission(I63_MAX + 1, &chain[0], 0);
        assert!(!handler.accept(&chain[0], &bad_eon).await.unwrap());

        let mut bad_gas = submission(1, &chain[0], 0);
        if let ContractEvent::TransactionSubmitted(event) = &mut bad_gas {
            event.gas_limit = U256::from(I63_MAX) + 1;
        }
        assert!(!handler.accept(&chain[0], &bad_gas).await.unwrap());
    }
}
