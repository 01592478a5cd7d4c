//! # Validator Registry Handler
//!
//! Contract-event handler for the registry's `Updated` events. The payload
//! is a packed registration message; entries with the wrong version, chain
//! or registry address are dropped in `accept`, and stale nonces are
//! dropped in `handle` so each validator's latest intent wins.

use std::sync::Arc;

use async_trait::async_trait;
use kp_01_chain_follower::{
    ChainFollowerError, ChainUpdate, ContractEvent, ContractEventHandler,
    ValidatorRegistryUpdatedEvent,
};
use kp_02_keyper_store::{ValidatorRegistration, ValidatorRegistryStore};
use shared_types::{Address, Hash, Header, Log};

use crate::errors::RuntimeError;

/// Packed length of a registration message.
pub const REGISTRATION_MESSAGE_LEN: usize = 46;

/// Message version this node understands.
pub const REGISTRATION_MESSAGE_VERSION: u8 = 0;

/// A decoded validator registration message.
///
/// Wire layout, all integers big-endian: version (1 byte), chain id
/// (8 bytes), registry address (20 bytes), validator index (8 bytes),
/// nonce (8 bytes), registration flag (1 byte).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistrationMessage {
    /// Message format version.
    pub version: u8,
    /// Chain the message is meant for.
    pub chain_id: u64,
    /// Registry contract the message is meant for.
    pub validator_registry_address: Address,
    /// Beacon chain validator index.
    pub validator_index: u64,
    /// Strictly increasing per-validator nonce.
    pub nonce: u64,
    /// True for a registration, false for a deregistration.
    pub is_registration: bool,
}

impl RegistrationMessage {
    /// Decode a packed message.
    pub fn decode(bytes: &[u8]) -> Result<Self, RuntimeError> {
        if bytes.len() != REGISTRATION_MESSAGE_LEN {
            return Err(RuntimeError::MalformedRegistration(format!(
                "expected {REGISTRATION_MESSAGE_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let flag = bytes[45];
        if flag > 1 {
            return Err(RuntimeError::MalformedRegistration(format!(
                "registration flag must be 0 or 1, got {flag}"
            )));
        }
        let mut address = [0u8; 20];
        address.copy_from_slice(&bytes[9..29]);
        Ok(Self {
            version: bytes[0],
            chain_id: be_u64(&bytes[1..9]),
            validator_registry_address: address,
            validator_index: be_u64(&bytes[29..37]),
            nonce: be_u64(&bytes[37..45]),
            is_registration: flag == 1,
        })
    }

    /// Encode into the packed form.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(REGISTRATION_MESSAGE_LEN);
        bytes.push(self.version);
        bytes.extend_from_slice(&self.chain_id.to_be_bytes());
        bytes.extend_from_slice(&self.validator_registry_address);
        bytes.extend_from_slice(&self.validator_index.to_be_bytes());
        bytes.extend_from_slice(&self.nonce.to_be_bytes());
        bytes.push(u8::from(self.is_registration));
        bytes
    }
}

fn be_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_be_bytes(buf)
}

/// Ingests registry `Updated` events into the store.
pub struct ValidatorRegistryUpdatedHandler {
    registry_address: Address,
    chain_id: u64,
    store: Arc<dyn ValidatorRegistryStore>,
}

impl ValidatorRegistryUpdatedHandler {
    /// A handler writing into the given store.
    pub fn new(registry_address: Address, chain_id: u64, store: Arc<dyn ValidatorRegistryStore>) -> Self {
        Self {
            registry_address,
            chain_id,
            store,
        }
    }
}

#[async_trait]
impl ContractEventHandler for ValidatorRegistryUpdatedHandler {
    fn address(&self) -> Address {
        self.registry_address
    }

    fn topic(&self) -> Hash {
        ValidatorRegistryUpdatedEvent::topic()
    }

    fn parse(&self, log: &Log) -> Result<ContractEvent, ChainFollowerError> {
        Ok(ContractEvent::ValidatorRegistryUpdated(
            ValidatorRegistryUpdatedEvent::decode(log)?,
        ))
    }

    async fn accept(
        &self,
        _header: &Header,
        event: &ContractEvent,
    ) -> Result<bool, ChainFollowerError> {
        let ContractEvent::ValidatorRegistryUpdated(event) = event else {
            return Ok(false);
        };
        let message = match RegistrationMessage::decode(&event.message) {
            Ok(message) => message,
            Err(error) => {
                tracing::warn!(%error, block = event.block_number, "Dropping registry update");
                return Ok(false);
            }
        };
        if message.version != REGISTRATION_MESSAGE_VERSION {
            tracing::warn!(
                version = message.version,
                "Dropping registry update with unknown version"
            );
            return Ok(false);
        }
        if message.chain_id != self.chain_id {
            tracing::warn!(
                chain_id = message.chain_id,
                "Dropping registry update for another chain"
            );
            return Ok(false);
        }
        if message.validator_registry_address != self.registry_address {
            tracing::warn!("Dropping registry update for another registry");
            return Ok(false);
        }
        Ok(true)
    }

    async fn handle(
        &self,
        _update: &ChainUpdate,
        events: &[ContractEvent],
    ) -> Result<(), ChainFollowerError> {
        for event in events {
            let ContractEvent::ValidatorRegistryUpdated(event) = event else {
                continue;
            };
            // accept already validated the envelope.
            let message = match RegistrationMessage::decode(&event.message) {
                Ok(message) => message,
                Err(error) => {
                    tracing::warn!(%error, "Skipping undecodable registry update");
                    continue;
                }
            };
            let latest = self
                .store
                .latest_nonce(message.validator_index)
                .await
                .map_err(RuntimeError::from)?;
            if latest.is_some_and(|nonce| nonce >= message.nonce) {
                tracing::warn!(
                    validator = message.validator_index,
                    nonce = message.nonce,
                    "Skipping registry update with stale nonce"
                );
                continue;
            }
            self.store
                .insert_registration(ValidatorRegistration {
                    validator_index: message.validator_index,
                    nonce: message.nonce,
                    is_registration: message.is_registration,
                    block_number: event.block_number,
                })
                .await
                .map_err(RuntimeError::from)?;
            tracing::info!(
                validator = message.validator_index,
                nonce = message.nonce,
                registered = message.is_registration,
                "Applied validator registry update"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kp_01_chain_follower::testing::{header_chain, test_hash};
    use kp_01_chain_follower::ChainSegment;
    use kp_02_keyper_store::MemoryKeyperStore;

    const REGISTRY: Address = [0x7E; 20];
    const CHAIN_ID: u64 = 1337;

    fn handler() -> (ValidatorRegistryUpdatedHandler, Arc<MemoryKeyperStore>) {
        let store = Arc::new(MemoryKeyperStore::new());
        let handler = ValidatorRegistryUpdatedHandler::new(REGISTRY, CHAIN_ID, store.clone());
        (handler, store)
    }

    fn message(validator_index: u64, nonce: u64, is_registration: bool) -> RegistrationMessage {
        RegistrationMessage {
            version: REGISTRATION_MESSAGE_VERSION,
            chain_id: CHAIN_ID,
            validator_registry_address: REGISTRY,
            validator_index,
            nonce,
            is_registration,
        }
    }

    fn updated(message: &RegistrationMessage, block_number: u64) -> ContractEvent {
        ContractEvent::ValidatorRegistryUpdated(ValidatorRegistryUpdatedEvent {
            message: message.encode(),
            signature: vec![0; 96],
            block_hash: test_hash(0, block_number),
            block_number,
        })
    }

    fn update() -> ChainUpdate {
        ChainUpdate {
            remove: None,
            append: ChainSegment::new(header_chain(0, 8, 1)).unwrap(),
        }
    }

    #[test]
    fn test_message_round_trip() {
        let message = message(7, 3, true);
        let decoded = RegistrationMessage::decode(&message.encode()).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn test_malformed_messages_are_rejected() {
        assert!(RegistrationMessage::decode(&[0; 45]).is_err());
        let mut bytes = message(7, 3, true).encode();
        bytes[45] = 2;
        assert!(RegistrationMessage::decode(&bytes).is_err());
    }

    #[tokio::test]
    async fn test_registration_is_stored() {
        let (handler, store) = handler();
        let event = updated(&message(7, 1, true), 8);
        assert!(handler.accept(&header_chain(0, 8, 1)[0], &event).await.unwrap());

        handler.handle(&update(), &[event]).await.unwrap();
        assert_eq!(store.latest_nonce(7).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_stale_nonce_is_skipped() {
        let (handler, store) = handler();
        handler
            .handle(&update(), &[updated(&message(7, 5, true), 8)])
            .await
            .unwrap();
        // Equal and lower nonces are both stale.
        handler
            .handle(&update(), &[updated(&message(7, 5, false), 9)])
            .await
            .unwrap();
        handler
            .handle(&update(), &[updated(&message(7, 4, false), 9)])
            .await
            .unwrap();
        assert_eq!(store.latest_nonce(7).await.unwrap(), Some(5));
    }

    #[tokio::test]
    async fn test_deregistration_advances_nonce() {
        let (handler, store) = handler();
        handler
            .handle(
                &update(),
                &[
                    updated(&message(7, 1, true), 8),
                    updated(&message(7, 2, false), 8),
                ],
            )
            .await
            .unwrap();
        assert_eq!(store.latest_nonce(7).await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_accept_filters_foreign_messages() {
        let (handler, _) = handler();
        let header = &header_chain(0, 8, 1)[0];

        let mut wrong_chain = message(7, 1, true);
        wrong_chain.chain_id = 1;
        assert!(!handler.accept(header, &updated(&wrong_chain, 8)).await.unwrap());

        let mut wrong_registry = message(7, 1, true);
        wrong_registry.validator_registry_address = [0x01; 20];
        assert!(!handler
            .accept(header, &updated(&wrong_registry, 8))
            .await
            .unwrap());

        let mut wrong_version = message(7, 1, true);
        wrong_version.version = 9;
        assert!(!handler
            .accept(header, &updated(&wrong_version, 8))
            .await
            .unwrap());

        let truncated = ContractEvent::ValidatorRegistryUpdated(ValidatorRegistryUpdatedEvent {
            message: vec![0; 10],
            signature: vec![],
            block_hash: test_hash(0, 8),
            block_number: 8,
        });
        assert!(!handler.accept(header, &truncated).await.unwrap());
    }
}
