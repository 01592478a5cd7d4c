//! # Eon Key Publisher
//!
//! Consumes derived eon public keys and votes for them on chain. One
//! attempt runs all gates and, when they pass, submits and awaits the
//! receipt; any failure along the way retries the whole attempt, which
//! keeps double votes impossible (the gates re-run every time).

use std::sync::Arc;

use kp_02_keyper_store::KeyperSetStore;
use shared_types::{retry_with_interval, EonPublicKey, ShutdownSignal};
use tokio::sync::mpsc;

use crate::config::PublisherConfig;
use crate::domain::PublisherError;
use crate::ports::EonKeyPublishContract;

/// How one publish attempt ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The vote was submitted and mined successfully.
    Published,
    /// No keyper set is known for the eon.
    NoKeyperSet,
    /// This node is not a member of the eon's keyper set.
    NotAMember,
    /// This keyper has already voted for this eon.
    AlreadyVoted,
    /// The key is already confirmed on chain.
    AlreadyConfirmed,
}

/// Publishes eon public keys to the eon-key-publish contract.
pub struct EonKeyPublisher {
    config: PublisherConfig,
    store: Arc<dyn KeyperSetStore>,
    contract: Arc<dyn EonKeyPublishContract>,
}

impl EonKeyPublisher {
    /// A publisher voting as `config.own_address`.
    pub fn new(
        config: PublisherConfig,
        store: Arc<dyn KeyperSetStore>,
        contract: Arc<dyn EonKeyPublishContract>,
    ) -> Self {
        Self {
            config,
            store,
            contract,
        }
    }

    /// Consume derived keys until the channel closes or shutdown is
    /// signalled.
    pub async fn run(self, mut keys: mpsc::Receiver<EonPublicKey>, mut shutdown: ShutdownSignal) {
        loop {
            let key = tokio::select! {
                _ = shutdown.cancelled() => return,
                key = keys.recv() => match key {
                    Some(key) => key,
                    None => return,
                },
            };
            self.publish(&key, &mut shutdown).await;
        }
    }

    /// Publish one eon key, retrying transient failures on the configured
    /// interval until success, a skip, or shutdown.
    pub async fn publish(&self, key: &EonPublicKey, shutdown: &mut ShutdownSignal) {
        let outcome = retry_with_interval(shutdown, self.config.retry_interval(), || {
            self.try_publish(key)
        })
        .await;
        match outcome {
            Some(PublishOutcome::Published) => {
                tracing::info!(eon = key.eon, "Published eon key");
            }
            Some(skip) => {
                tracing::info!(eon = key.eon, ?skip, "Not publishing eon key");
            }
            None => {
                tracing::debug!(eon = key.eon, "Shutdown while publishing eon key");
            }
        }
    }

    async fn try_publish(&self, key: &EonPublicKey) -> Result<PublishOutcome, PublisherError> {
        let Some(keyper_set) = self.store.keyper_set_by_index(key.eon).await? else {
            return Ok(PublishOutcome::NoKeyperSet);
        };
        let Some(keyper_index) = keyper_set.index_of(&self.config.own_address) else {
            return Ok(PublishOutcome::NotAMember);
        };
        if self.contract.has_keyper_voted(&self.config.own_address).await? {
            return Ok(PublishOutcome::AlreadyVoted);
        }
        if self.contract.eon_key_confirmed(&key.public_key).await? {
            return Ok(PublishOutcome::AlreadyConfirmed);
        }

        let tx_hash = self
            .contract
            .publish_eon_key(&key.public_key, keyper_index)
            .await?;
        let receipt = self.contract.wait_mined(tx_hash).await?;
        if !receipt.success {
            return Err(PublisherError::ReceiptNotSuccessful { eon: key.eon });
        }
        Ok(PublishOutcome::Published)
    }
}
