//! # Messaging Middleware
//!
//! Outgoing messages are bound to the trigger the slot scheduler recorded:
//! shares carry this keyper's slot signature, keys carry the collected
//! threshold signatures and advance the eon's tx pointer.

use std::sync::Arc;

use k256::ecdsa::SigningKey;
use kp_02_keyper_store::{
    DecryptionTriggerStore, KeyperSetStore, SlotDecryptionSignature, SlotSignatureStore,
    TransactionSubmittedStore, TxPointer, TxPointerStore,
};
use kp_05_slot_signature::SlotDecryptionSignatureData;

use crate::config::MessagingConfig;
use crate::domain::{
    DecryptionKeyShares, DecryptionKeys, KeysExtra, MessagingError, SharesExtra,
};

/// The store surface the middleware needs.
pub trait MiddlewareStore:
    TransactionSubmittedStore
    + DecryptionTriggerStore
    + SlotSignatureStore
    + TxPointerStore
    + KeyperSetStore
{
}

impl<T> MiddlewareStore for T where
    T: TransactionSubmittedStore
        + DecryptionTriggerStore
        + SlotSignatureStore
        + TxPointerStore
        + KeyperSetStore
{
}

/// Intercepts share and key messages between the keyper core and the wire.
pub struct MessagingMiddleware {
    config: MessagingConfig,
    signing_key: SigningKey,
    store: Arc<dyn MiddlewareStore>,
}

impl MessagingMiddleware {
    /// A middleware signing with `signing_key`.
    pub fn new(
        config: MessagingConfig,
        signing_key: SigningKey,
        store: Arc<dyn MiddlewareStore>,
    ) -> Self {
        Self {
            config,
            signing_key,
            store,
        }
    }

    pub(crate) fn config(&self) -> &MessagingConfig {
        &self.config
    }

    pub(crate) fn store(&self) -> &dyn MiddlewareStore {
        self.store.as_ref()
    }

    /// Bind an outgoing share message to the recorded trigger and sign it.
    /// Returns `None` when the message has no slot context and must be
    /// dropped.
    pub async fn process_outgoing_key_shares(
        &self,
        mut message: DecryptionKeyShares,
    ) -> Result<Option<DecryptionKeyShares>, MessagingError> {
        let Some(trigger) = self.store.current_trigger(message.eon).await? else {
            tracing::warn!(
                eon = message.eon,
                "No recorded trigger for outgoing shares, dropping"
            );
            return Ok(None);
        };
        let identities_hash = message.identities_hash();
        if identities_hash != trigger.identities_hash {
            tracing::warn!(
                eon = message.eon,
                slot = trigger.slot,
                "Outgoing shares do not match the recorded trigger, dropping"
            );
            return Ok(None);
        }

        let data = SlotDecryptionSignatureData {
            instance_id: self.config.instance_id,
            eon: message.eon,
            slot: trigger.slot,
            tx_pointer: trigger.tx_pointer,
            identity_preimages: message.identity_preimages(),
        };
        let signature = data.sign(&self.signing_key)?;
        self.store
            .insert_slot_signature(SlotDecryptionSignature {
                eon: message.eon,
                slot: trigger.slot,
                keyper_index: message.keyper_index,
                tx_pointer: trigger.tx_pointer,
                identities_hash,
                signature: signature.clone(),
            })
            .await?;

        message.extra = Some(SharesExtra {
            slot: trigger.slot,
            tx_pointer: trigger.tx_pointer,
            signature,
        });
        Ok(Some(message))
    }

    /// Bind an outgoing keys message to the recorded trigger, attach the
    /// collected threshold signatures and advance the tx pointer. Returns
    /// `None` while fewer than threshold-many signatures are recorded.
    pub async fn process_outgoing_keys(
        &self,
        mut message: DecryptionKeys,
    ) -> Result<Option<DecryptionKeys>, MessagingError> {
        if message.keys.is_empty() {
            tracing::warn!(eon = message.eon, "Outgoing keys message is empty, dropping");
            return Ok(None);
        }
        let Some(trigger) = self.store.current_trigger(message.eon).await? else {
            tracing::warn!(
                eon = message.eon,
                "No recorded trigger for outgoing keys, dropping"
            );
            return Ok(None);
        };
        let identities_hash = message.identities_hash();
        if identities_hash != trigger.identities_hash {
            tracing::warn!(
                eon = message.eon,
                slot = trigger.slot,
                "Outgoing keys do not match the recorded trigger, dropping"
            );
            return Ok(None);
        }
        let Some(keyper_set) = self.store.keyper_set_by_index(message.eon).await? else {
            tracing::warn!(eon = message.eon, "No keyper set for eon, dropping keys");
            return Ok(None);
        };

        let signatures = self
            .store
            .slot_signatures(
                message.eon,
                trigger.slot,
                trigger.tx_pointer,
                &identities_hash,
                keyper_set.threshold as u64,
            )
            .await?;
        if signatures.len() < keyper_set.threshold as usize {
            tracing::debug!(
                eon = message.eon,
                slot = trigger.slot,
                have = signatures.len(),
                need = keyper_set.threshold,
                "Not enough slot signatures yet, holding keys back"
            );
            return Ok(None);
        }

        self.advance_tx_pointer(message.eon, trigger.tx_pointer, message.keys.len() as u64)
            .await?;

        message.extra = Some(KeysExtra {
            slot: trigger.slot,
            tx_pointer: trigger.tx_pointer,
            signer_indices: signatures.iter().map(|s| s.keyper_index).collect(),
            signatures: signatures.into_iter().map(|s| s.signature).collect(),
        });
        Ok(Some(message))
    }

    /// Advance the tx pointer for an inbound, already-validated keys
    /// message.
    pub async fn handle_inbound_keys(
        &self,
        message: &DecryptionKeys,
    ) -> Result<(), MessagingError> {
        let Some(extra) = &message.extra else {
            return Ok(());
        };
        if message.keys.is_empty() {
            return Ok(());
        }
        self.advance_tx_pointer(message.eon, extra.tx_pointer, message.keys.len() as u64)
            .await
    }

    /// The first key is the slot identity, so `num_keys` keys consume
    /// `num_keys - 1` queue entries.
    async fn advance_tx_pointer(
        &self,
        eon: u64,
        from: u64,
        num_keys: u64,
    ) -> Result<(), MessagingError> {
        let synced = self
            .store
            .synced_until()
            .await?
            .ok_or(MessagingError::NoSyncedBlock)?;
        let value = from + num_keys - 1;
        tracing::debug!(eon, value, block = synced.block_number, "Advancing tx pointer");
        self.store
            .set_tx_pointer(TxPointer {
                eon,
                value,
                block: synced.block_number,
            })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DecryptionKey, KeyShare};
    use kp_02_keyper_store::{CurrentDecryptionTrigger, MemoryKeyperStore, SyncedUntil};
    use rand::rngs::OsRng;
    use shared_types::{
        address_from_public_key, hash_identities, Address, IdentityPreimage, KeyperSet,
    };

    fn keyper_address(key: &SigningKey) -> Address {
        address_from_public_key(key.verifying_key().to_encoded_point(false).as_bytes())
    }

    fn preimages(slot: u64) -> Vec<IdentityPreimage> {
        vec![
            IdentityPreimage::from_slot(slot),
            IdentityPreimage::from_prefix_and_sender(&[1; 32], &[0xCD; 20]),
            IdentityPreimage::from_prefix_and_sender(&[2; 32], &[0xCD; 20]),
        ]
    }

    async fn store_with_trigger(slot: u64) -> Arc<MemoryKeyperStore> {
        let store = Arc::new(MemoryKeyperStore::new());
        store
            .set_synced_until(SyncedUntil {
                block_hash: [7; 32],
                block_number: 100,
                slot: slot - 1,
            })
            .await
            .unwrap();
        store
            .set_current_trigger(CurrentDecryptionTrigger {
                eon: 1,
                slot,
                tx_pointer: 3,
                identities_hash: hash_identities(&preimages(slot)),
            })
            .await
            .unwrap();
        store
    }

    fn shares_message(slot: u64) -> DecryptionKeyShares {
        DecryptionKeyShares {
            instance_id: 42,
            eon: 1,
            keyper_index: 0,
            shares: preimages(slot)
                .into_iter()
                .map(|identity_preimage| KeyShare {
                    identity_preimage,
                    share: vec![0x55; 32],
                })
                .collect(),
            extra: None,
        }
    }

    fn keys_message(slot: u64) -> DecryptionKeys {
        DecryptionKeys {
            instance_id: 42,
            eon: 1,
            keys: preimages(slot)
                .into_iter()
                .map(|identity_preimage| DecryptionKey {
                    identity_preimage,
                    key: vec![0x66; 32],
                })
                .collect(),
            extra: None,
        }
    }

    fn middleware(store: Arc<MemoryKeyperStore>, key: SigningKey) -> MessagingMiddleware {
        MessagingMiddleware::new(MessagingConfig::for_testing(), key, store)
    }

    #[tokio::test]
    async fn test_outgoing_shares_are_signed_and_recorded() {
        let key = SigningKey::random(&mut OsRng);
        let store = store_with_trigger(20).await;
        let mw = middleware(store.clone(), key.clone());

        let sent = mw
            .process_outgoing_key_shares(shares_message(20))
            .await
            .unwrap()
            .expect("message should pass through");
        let extra = sent.extra.expect("extra attached");
        assert_eq!(extra.slot, 20);
        assert_eq!(extra.tx_pointer, 3);

        let data = SlotDecryptionSignatureData {
            instance_id: 42,
            eon: 1,
            slot: 20,
            tx_pointer: 3,
            identity_preimages: preimages(20),
        };
        assert!(data.verify(&extra.signature, &keyper_address(&key)).unwrap());

        let recorded = store
            .slot_signatures(1, 20, 3, &hash_identities(&preimages(20)), 10)
            .await
            .unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].signature, extra.signature);
    }

    #[tokio::test]
    async fn test_outgoing_shares_without_trigger_are_dropped() {
        let key = SigningKey::random(&mut OsRng);
        let store = Arc::new(MemoryKeyperStore::new());
        let mw = middleware(store, key);
        let result = mw
            .process_outgoing_key_shares(shares_message(20))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_outgoing_shares_with_unexpected_identities_are_dropped() {
        let key = SigningKey::random(&mut OsRng);
        let store = store_with_trigger(20).await;
        let mw = middleware(store, key);

        let mut message = shares_message(20);
        message.shares.pop();
        let result = mw.process_outgoing_key_shares(message).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_outgoing_keys_held_until_threshold() {
        let keys: Vec<SigningKey> = (0..3).map(|_| SigningKey::random(&mut OsRng)).collect();
        let store = store_with_trigger(20).await;
        store
            .insert_keyper_set(KeyperSet {
                keyper_config_index: 1,
                activation_block_number: 50,
                members: keys.iter().map(keyper_address).collect(),
                threshold: 2,
            })
            .await
            .unwrap();

        // Only keyper 0 has signed so far.
        let mw0 = middleware(store.clone(), keys[0].clone());
        mw0.process_outgoing_key_shares(shares_message(20))
            .await
            .unwrap()
            .unwrap();
        assert!(mw0
            .process_outgoing_keys(keys_message(20))
            .await
            .unwrap()
            .is_none());

        // Keyper 2 signs as well; now the keys go out with both signatures.
        let mw2 = middleware(store.clone(), keys[2].clone());
        let mut shares = shares_message(20);
        shares.keyper_index = 2;
        mw2.process_outgoing_key_shares(shares).await.unwrap().unwrap();

        let sent = mw0
            .process_outgoing_keys(keys_message(20))
            .await
            .unwrap()
            .expect("threshold reached");
        let extra = sent.extra.unwrap();
        assert_eq!(extra.signer_indices, vec![0, 2]);
        assert_eq!(extra.signatures.len(), 2);

        // Pointer advanced past the two selected submissions.
        let pointer = store.tx_pointer(1).await.unwrap().unwrap();
        assert_eq!(pointer.value, 3 + 2);
        assert_eq!(pointer.block, 100);
    }

    #[tokio::test]
    async fn test_inbound_keys_advance_pointer() {
        let key = SigningKey::random(&mut OsRng);
        let store = store_with_trigger(20).await;
        let mw = middleware(store.clone(), key);

        let mut message = keys_message(20);
        message.extra = Some(KeysExtra {
            slot: 20,
            tx_pointer: 3,
            signer_indices: vec![0, 1],
            signatures: vec![vec![0; 65], vec![1; 65]],
        });
        mw.handle_inbound_keys(&message).await.unwrap();

        let pointer = store.tx_pointer(1).await.unwrap().unwrap();
        assert_eq!(pointer.value, 5);
        assert_eq!(pointer.block, 100);
    }
}
