//! # Full Slot Pipeline
//!
//! Walks one slot through the whole pipeline with two keypers sharing a
//! store: sequencer submissions are synced, the scheduler produces the
//! trigger, both keypers sign their share messages, the keys message goes
//! out once the threshold is met and validates cleanly on the other side.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use k256::ecdsa::SigningKey;
    use kp_01_chain_follower::{
        ChainSegment, ChainUpdate, ContractEvent, ContractEventHandler, TransactionSubmittedEvent,
    };
    use kp_01_chain_follower::testing::header_chain;
    use kp_02_keyper_store::{
        EonStore, KeyperSetStore, MemoryKeyperStore, TransactionSubmittedStore, TxPointerStore,
    };
    use kp_03_sequencer_sync::{SequencerSyncConfig, SequencerSyncHandler};
    use kp_04_slot_scheduler::{SchedulerConfig, SlotScheduler};
    use kp_06_messaging::{
        DecryptionKey, DecryptionKeyShares, DecryptionKeys, KeyShare, MessagingConfig,
        MessagingMiddleware, ValidationOutcome,
    };
    use primitive_types::U256;
    use rand::rngs::OsRng;
    use shared_types::{address_from_public_key, Address, Eon, IdentityPreimage, KeyperSet};

    fn keyper_address(key: &SigningKey) -> Address {
        address_from_public_key(key.verifying_key().to_encoded_point(false).as_bytes())
    }

    fn submission(header: &shared_types::Header, log_index: u64) -> ContractEvent {
        ContractEvent::TransactionSubmitted(TransactionSubmittedEvent {
            eon: 1,
            identity_prefix: [log_index as u8 + 1; 32],
            sender: [0xCD; 20],
            encrypted_transaction: vec![1, 2, 3],
            gas_limit: U256::from(30_000u64),
            block_hash: header.hash,
            block_number: header.number,
            tx_index: 0,
            log_index,
        })
    }

    fn shares_from(preimages: &[IdentityPreimage], keyper_index: u64) -> DecryptionKeyShares {
        DecryptionKeyShares {
            instance_id: 42,
            eon: 1,
            keyper_index,
            shares: preimages
                .iter()
                .cloned()
                .map(|identity_preimage| KeyShare {
                    identity_preimage,
                    share: vec![0x55; 32],
                })
                .collect(),
            extra: None,
        }
    }

    fn keys_from(preimages: &[IdentityPreimage]) -> DecryptionKeys {
        DecryptionKeys {
            instance_id: 42,
            eon: 1,
            keys: preimages
                .iter()
                .cloned()
                .map(|identity_preimage| DecryptionKey {
                    identity_preimage,
                    key: vec![0x66; 32],
                })
                .collect(),
            extra: None,
        }
    }

    #[tokio::test]
    async fn test_slot_flows_from_submissions_to_validated_keys() {
        let store = Arc::new(MemoryKeyperStore::new());
        let signing_keys: Vec<SigningKey> =
            (0..2).map(|_| SigningKey::random(&mut OsRng)).collect();
        let members: Vec<Address> = signing_keys.iter().map(keyper_address).collect();

        store
            .insert_keyper_set(KeyperSet {
                keyper_config_index: 1,
                activation_block_number: 95,
                members: members.clone(),
                threshold: 2,
            })
            .await
            .unwrap();
        store
            .insert_eon(Eon {
                eon: 1,
                activation_block_number: 95,
            })
            .await
            .unwrap();

        // Two submissions land in block 100 and are synced.
        let chain = header_chain(0, 95, 6);
        let head = chain[5].clone();
        let syncer = SequencerSyncHandler::new(SequencerSyncConfig::for_testing(), store.clone());
        syncer
            .handle(
                &ChainUpdate {
                    remove: None,
                    append: ChainSegment::new(chain).unwrap(),
                },
                &[submission(&head, 0), submission(&head, 1)],
            )
            .await
            .unwrap();
        assert_eq!(store.event_count(1).await.unwrap(), 2);

        // Slot 101 is due: the trigger selects the slot identity plus both
        // submissions.
        let mut scheduler_config = SchedulerConfig::for_testing();
        scheduler_config.own_address = members[0];
        let scheduler = SlotScheduler::new(scheduler_config, store.clone());
        let trigger = scheduler.trigger_for_slot(101).await.unwrap();
        assert_eq!(trigger.block_number, 100);
        assert_eq!(trigger.identity_preimages.len(), 3);

        // Both keypers sign their share messages against the trigger.
        let middlewares: Vec<MessagingMiddleware> = signing_keys
            .iter()
            .map(|key| {
                MessagingMiddleware::new(
                    MessagingConfig::for_testing(),
                    key.clone(),
                    store.clone(),
                )
            })
            .collect();
        for (index, mw) in middlewares.iter().enumerate() {
            let sent = mw
                .process_outgoing_key_shares(shares_from(
                    &trigger.identity_preimages,
                    index as u64,
                ))
                .await
                .unwrap()
                .expect("shares should pass through");
            assert_eq!(sent.extra.as_ref().unwrap().slot, 101);

            // Each keyper also validates the other's shares on arrival.
            let outcome = middlewares[1 - index].validate_key_shares(&sent).await;
            assert!(outcome.is_accept(), "shares rejected: {outcome:?}");
        }

        // With both signatures recorded the keys message goes out, carrying
        // them and advancing the pointer past the two submissions.
        let sent = middlewares[0]
            .process_outgoing_keys(keys_from(&trigger.identity_preimages))
            .await
            .unwrap()
            .expect("threshold met");
        let extra = sent.extra.as_ref().unwrap();
        assert_eq!(extra.signer_indices, vec![0, 1]);
        assert_eq!(extra.signatures.len(), 2);
        let pointer = store.tx_pointer(1).await.unwrap().unwrap();
        assert_eq!(pointer.value, 2);
        assert_eq!(pointer.block, 100);

        // The receiving keyper accepts the message and converges on the
        // same pointer.
        let outcome = middlewares[1].validate_keys(&sent).await;
        assert!(outcome.is_accept(), "keys rejected: {outcome:?}");
        middlewares[1].handle_inbound_keys(&sent).await.unwrap();
        let pointer = store.tx_pointer(1).await.unwrap().unwrap();
        assert_eq!(pointer.value, 2);
        assert_eq!(pointer.block, 100);
    }

    #[tokio::test]
    async fn test_tampered_keys_are_rejected_downstream() {
        let store = Arc::new(MemoryKeyperStore::new());
        let signing_keys: Vec<SigningKey> =
            (0..2).map(|_| SigningKey::random(&mut OsRng)).collect();
        let members: Vec<Address> = signing_keys.iter().map(keyper_address).collect();
        store
            .insert_keyper_set(KeyperSet {
                keyper_config_index: 1,
                activation_block_number: 95,
                members,
                threshold: 2,
            })
            .await
            .unwrap();
        store
            .insert_eon(Eon {
                eon: 1,
                activation_block_number: 95,
            })
            .await
            .unwrap();

        let chain = header_chain(0, 95, 6);
        let head = chain[5].clone();
        let syncer = SequencerSyncHandler::new(SequencerSyncConfig::for_testing(), store.clone());
        syncer
            .handle(
                &ChainUpdate {
                    remove: None,
                    append: ChainSegment::new(chain).unwrap(),
                },
                &[submission(&head, 0)],
            )
            .await
            .unwrap();

        let mut scheduler_config = SchedulerConfig::for_testing();
        scheduler_config.own_address = keyper_address(&signing_keys[0]);
        let trigger = SlotScheduler::new(scheduler_config, store.clone())
            .trigger_for_slot(101)
            .await
            .unwrap();

        let middlewares: Vec<MessagingMiddleware> = signing_keys
            .iter()
            .map(|key| {
                MessagingMiddleware::new(
                    MessagingConfig::for_testing(),
                    key.clone(),
                    store.clone(),
                )
            })
            .collect();
        for (index, mw) in middlewares.iter().enumerate() {
            mw.process_outgoing_key_shares(shares_from(&trigger.identity_preimages, index as u64))
                .await
                .unwrap()
                .unwrap();
        }
        let sent = middlewares[0]
            .process_outgoing_keys(keys_from(&trigger.identity_preimages))
            .await
            .unwrap()
            .unwrap();

        // Swapping a key invalidates the attested identities: the threshold
        // signatures no longer cover the message.
        let mut tampered = sent.clone();
        tampered.keys[0].identity_preimage = IdentityPreimage::from_slot(999);
        let outcome = middlewares[1].validate_keys(&tampered).await;
        assert!(
            matches!(outcome, ValidationOutcome::Reject(_)),
            "expected rejection, got {outcome:?}"
        );
    }
}
