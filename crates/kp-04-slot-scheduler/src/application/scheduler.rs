//! # Slot Scheduler
//!
//! The per-slot trigger algorithm. Each slot, decide which identity
//! preimages the keyper core should release decryption keys for: the slot
//! identity plus a gas-bounded prefix of the submission queue starting at
//! the eon's tx pointer.

use std::sync::Arc;

use kp_02_keyper_store::{
    CurrentDecryptionTrigger, DecryptionTriggerStore, EonStore, KeyperSetStore,
    TransactionSubmittedStore, TxPointerStore,
};
use shared_types::{hash_identities, DecryptionTrigger, IdentityPreimage, ShutdownSignal};
use tokio::sync::mpsc;

use crate::config::SchedulerConfig;
use crate::domain::SchedulerError;

/// The store surface the scheduler needs.
pub trait SchedulerStore:
    TransactionSubmittedStore + TxPointerStore + DecryptionTriggerStore + KeyperSetStore + EonStore
{
}

impl<T> SchedulerStore for T where
    T: TransactionSubmittedStore
        + TxPointerStore
        + DecryptionTriggerStore
        + KeyperSetStore
        + EonStore
{
}

/// Produces decryption triggers from slot ticks.
pub struct SlotScheduler {
    config: SchedulerConfig,
    store: Arc<dyn SchedulerStore>,
}

impl SlotScheduler {
    /// A scheduler reading from the given store.
    pub fn new(config: SchedulerConfig, store: Arc<dyn SchedulerStore>) -> Self {
        Self { config, store }
    }

    /// Consume slot ticks and emit triggers until the channel closes or
    /// shutdown is signalled. Skips are logged at debug, store failures at
    /// warn; the next slot always retries from scratch.
    pub async fn run(
        self,
        mut slots: mpsc::Receiver<u64>,
        triggers: mpsc::Sender<DecryptionTrigger>,
        mut shutdown: ShutdownSignal,
    ) {
        loop {
            let slot = tokio::select! {
                _ = shutdown.cancelled() => return,
                slot = slots.recv() => match slot {
                    Some(slot) => slot,
                    None => return,
                },
            };
            match self.trigger_for_slot(slot).await {
                Ok(trigger) => {
                    tracing::info!(
                        slot,
                        block = trigger.block_number,
                        identities = trigger.identity_preimages.len(),
                        "Produced decryption trigger"
                    );
                    if triggers.send(trigger).await.is_err() {
                        return;
                    }
                }
                Err(error) if error.is_skip() => {
                    tracing::debug!(slot, reason = %error, "Skipping slot");
                }
                Err(error) => {
                    tracing::warn!(slot, %error, "Slot processing failed");
                }
            }
        }
    }

    /// Run the trigger algorithm for one slot.
    pub async fn trigger_for_slot(
        &self,
        slot: u64,
    ) -> Result<DecryptionTrigger, SchedulerError> {
        let synced = self
            .store
            .synced_until()
            .await?
            .ok_or(SchedulerError::NotSynced)?;
        if synced.slot >= slot {
            return Err(SchedulerError::SlotAlreadyProcessed {
                slot,
                synced_slot: synced.slot,
            });
        }

        let keyper_set = self
            .store
            .keyper_set_for_block(synced.block_number)
            .await?
            .ok_or(SchedulerError::NoKeyperSetForBlock(synced.block_number))?;
        if !keyper_set.contains(&self.config.own_address) {
            return Err(SchedulerError::NotInKeyperSet);
        }

        let eon = self
            .store
            .eon_for_block(synced.block_number)
            .await?
            .ok_or(SchedulerError::NoEonForBlock(synced.block_number))?;

        let (mut pointer, age) = match self.store.tx_pointer(eon.eon).await? {
            Some(stored) => (
                stored.value,
                synced.block_number.saturating_sub(stored.block),
            ),
            None => (
                0,
                synced.block_number - eon.activation_block_number + 1,
            ),
        };
        if age == 0 {
            return Err(SchedulerError::TxPointerAgeZero);
        }
        if age > self.config.max_tx_pointer_age {
            let tail = self.store.event_count(eon.eon).await?;
            tracing::warn!(
                eon = eon.eon,
                age,
                pointer,
                tail,
                "Tx pointer too old, recovering to the queue tail"
            );
            pointer = tail;
        }

        // One more than the budget can possibly fit, so a short read means
        // the queue is exhausted.
        let limit =
            self.config.encrypted_gas_limit / self.config.min_gas_per_transaction + 1;
        let candidates = self
            .store
            .events_from_index(eon.eon, pointer, limit)
            .await?;

        let mut preimages = vec![IdentityPreimage::from_slot(slot)];
        let mut gas = 0u64;
        for candidate in &candidates {
            if gas + candidate.tx.gas_limit > self.config.encrypted_gas_limit {
                break;
            }
            gas += candidate.tx.gas_limit;
            preimages.push(IdentityPreimage::from_prefix_and_sender(
                &candidate.tx.identity_prefix,
                &candidate.tx.sender,
            ));
        }
        let preimages = IdentityPreimage::sorted(&preimages);
        let identities_hash = hash_identities(&preimages);

        self.store
            .set_current_trigger(CurrentDecryptionTrigger {
                eon: eon.eon,
                slot,
                tx_pointer: pointer,
                identities_hash,
            })
            .await?;

        Ok(DecryptionTrigger {
            block_number: synced.block_number,
            identity_preimages: preimages,
        })
    }
}
