//! # Chain Follower + Sequencer Sync
//!
//! Runs the real fetcher against the mock execution client and checks that
//! the sequencer queue in the store always mirrors the canonical chain,
//! reorgs included.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use kp_01_chain_follower::testing::{fork_chain, header_chain};
    use kp_01_chain_follower::{
        ExecutionClient, Fetcher, MemoryChainCache, MockExecutionClient, TransactionSubmittedEvent,
    };
    use kp_02_keyper_store::{MemoryKeyperStore, TransactionSubmittedStore};
    use kp_03_sequencer_sync::{SequencerSyncConfig, SequencerSyncHandler};
    use primitive_types::U256;
    use shared_types::Shutdown;

    const SEQUENCER: [u8; 20] = [0x5E; 20];

    fn submission_log(header: &shared_types::Header, log_index: u64) -> shared_types::Log {
        TransactionSubmittedEvent {
            eon: 0,
            identity_prefix: [log_index as u8 + 1; 32],
            sender: [0xCD; 20],
            encrypted_transaction: vec![1, 2, 3],
            gas_limit: U256::from(30_000u64),
            block_hash: header.hash,
            block_number: header.number,
            tx_index: 0,
            log_index,
        }
        .into_log(SEQUENCER)
    }

    async fn spawn_fetcher(
        client: &MockExecutionClient,
        store: Arc<MemoryKeyperStore>,
    ) -> Shutdown {
        let cache = Arc::new(MemoryChainCache::new(10));
        let mut fetcher = Fetcher::new(Arc::new(client.clone()), cache);
        fetcher.register_contract_event_handler(Arc::new(SequencerSyncHandler::new(
            SequencerSyncConfig::for_testing(),
            store,
        )));
        let heads = client.subscribe_new_heads().await.unwrap();
        let (shutdown, signal) = Shutdown::new();
        tokio::spawn(fetcher.run(heads, signal));
        shutdown
    }

    async fn wait_for_cursor(store: &MemoryKeyperStore, block_hash: shared_types::Hash) {
        for _ in 0..200 {
            if store
                .synced_until()
                .await
                .unwrap()
                .is_some_and(|c| c.block_hash == block_hash)
            {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("cursor never reached the expected block");
    }

    #[tokio::test]
    async fn test_reorg_replaces_sequencer_rows() {
        let client = MockExecutionClient::new();
        let chain = header_chain(0, 1, 2);
        client.set_canonical(chain.clone());
        client.add_log(submission_log(&chain[1], 0));

        let store = Arc::new(MemoryKeyperStore::new());
        let shutdown = spawn_fetcher(&client, store.clone()).await;
        wait_for_cursor(&store, chain[1].hash).await;
        assert_eq!(store.event_count(0).await.unwrap(), 1);

        // Block 2 reorgs away; its replacement carries a different
        // submission.
        let fork = fork_chain(&chain[0], 1, 1);
        client.add_log(submission_log(&fork[0], 0));
        client.push_head(fork[0].clone());

        wait_for_cursor(&store, fork[0].hash).await;
        let rows = store.events_from_index(0, 0, 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].index, 0);
        assert_eq!(rows[0].tx.block_hash, fork[0].hash);

        drop(shutdown);
    }

    #[tokio::test]
    async fn test_streamed_heads_keep_indices_contiguous() {
        let client = MockExecutionClient::new();
        let chain = header_chain(0, 1, 5);
        client.set_canonical(vec![chain[0].clone()]);
        for (i, header) in chain.iter().enumerate().skip(1) {
            client.add_log(submission_log(header, i as u64));
        }

        let store = Arc::new(MemoryKeyperStore::new());
        let shutdown = spawn_fetcher(&client, store.clone()).await;
        wait_for_cursor(&store, chain[0].hash).await;

        for header in &chain[1..] {
            client.push_head(header.clone());
        }
        wait_for_cursor(&store, chain[4].hash).await;

        let rows = store.events_from_index(0, 0, 10).await.unwrap();
        assert_eq!(rows.len(), 4);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.index, i as u64);
        }
        let cursor = store.synced_until().await.unwrap().unwrap();
        assert_eq!(cursor.block_number, 5);
        assert_eq!(cursor.slot, 5);

        drop(shutdown);
    }
}
