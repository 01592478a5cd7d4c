//! # Eon Key Broadcast Handler
//!
//! Contract-event handler for `EonKeyBroadcast`: records the confirmed eon
//! public key so the pipeline can gate on its presence. Like keyper sets,
//! broadcast keys are not rolled back on reorgs.

use std::sync::Arc;

use async_trait::async_trait;
use kp_01_chain_follower::{
    ChainFollowerError, ChainUpdate, ContractEvent, ContractEventHandler, EonKeyBroadcastEvent,
};
use kp_02_keyper_store::EonStore;
use shared_types::{Address, EonPublicKey, Hash, Header, Log};

use crate::errors::RuntimeError;

/// Ingests `EonKeyBroadcast` events into the store.
pub struct EonKeyBroadcastHandler {
    broadcast_address: Address,
    store: Arc<dyn EonStore>,
}

impl EonKeyBroadcastHandler {
    /// A handler writing into the given store.
    pub fn new(broadcast_address: Address, store: Arc<dyn EonStore>) -> Self {
        Self {
            broadcast_address,
            store,
        }
    }
}

#[async_trait]
impl ContractEventHandler for EonKeyBroadcastHandler {
    fn address(&self) -> Address {
        self.broadcast_address
    }

    fn topic(&self) -> Hash {
        EonKeyBroadcastEvent::topic()
    }

    fn parse(&self, log: &Log) -> Result<ContractEvent, ChainFollowerError> {
        Ok(ContractEvent::EonKeyBroadcast(EonKeyBroadcastEvent::decode(
            log,
        )?))
    }

    async fn accept(
        &self,
        _header: &Header,
        event: &ContractEvent,
    ) -> Result<bool, ChainFollowerError> {
        Ok(matches!(event, ContractEvent::EonKeyBroadcast(_)))
    }

    async fn handle(
        &self,
        _update: &ChainUpdate,
        events: &[ContractEvent],
    ) -> Result<(), ChainFollowerError> {
        for event in events {
            let ContractEvent::EonKeyBroadcast(event) = event else {
                continue;
            };
            self.store
                .set_eon_key(EonPublicKey {
                    eon: event.eon,
                    public_key: event.key.clone(),
                })
                .await
                .map_err(RuntimeError::from)?;
            tracing::info!(eon = event.eon, "Recorded broadcast eon key");
        }
        Ok(())
    }
}
