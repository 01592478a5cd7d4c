//! # Node Wiring
//!
//! Builds a running keyper node out of the subsystem crates: one store, one
//! chain follower with all contract-event handlers registered, the slot
//! ticker feeding the scheduler, the sync monitor and the eon key
//! publisher, all cancelled by a single shutdown handle.
//!
//! The key-generation core is not part of this crate. It plugs into the
//! returned [`KeyperHandles`]: decryption triggers and new keyper sets flow
//! out, eon public keys produced by the DKG flow back in, and peer messages
//! pass through the exposed messaging middleware.

use std::sync::Arc;

use anyhow::{Context, Result};
use k256::ecdsa::SigningKey;
use kp_01_chain_follower::{ExecutionClient, Fetcher, MemoryChainCache};
use kp_02_keyper_store::{EonStore, MemoryKeyperStore};
use kp_03_sequencer_sync::SequencerSyncHandler;
use kp_04_slot_scheduler::{Clock, SlotScheduler, SlotTicker, SystemClock};
use kp_06_messaging::MessagingMiddleware;
use kp_07_sync_monitor::SyncMonitor;
use kp_08_eon_key_publisher::{EonKeyPublishContract, EonKeyPublisher};
use shared_types::{DecryptionTrigger, EonPublicKey, KeyperSet, Shutdown};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::KeyperConfig;
use crate::handlers::{
    EonKeyBroadcastHandler, KeyperSetAddedHandler, ValidatorRegistryUpdatedHandler,
};
use crate::ports::KeyperSetContract;

/// Capacity of the eon key intake and publish channels. Keys arrive once
/// per eon, so backpressure here is theoretical.
const EON_KEY_CHANNEL_CAPACITY: usize = 8;

/// Install the global tracing subscriber, honoring `RUST_LOG`.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    // A second init (tests) keeps the first subscriber.
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// A keyper node ready to start.
pub struct KeyperNode {
    config: KeyperConfig,
    client: Arc<dyn ExecutionClient>,
    keyper_set_contract: Arc<dyn KeyperSetContract>,
    eon_key_publish_contract: Arc<dyn EonKeyPublishContract>,
    signing_key: SigningKey,
    clock: Arc<dyn Clock>,
}

/// The running node's surface towards the key-generation core.
///
/// Dropping the handles shuts the node down.
pub struct KeyperHandles {
    /// The node's store, shared with all subsystems.
    pub store: Arc<MemoryKeyperStore>,
    /// Messaging middleware for outgoing and inbound peer messages.
    pub middleware: Arc<MessagingMiddleware>,
    /// Decryption triggers emitted by the slot scheduler, one per due slot.
    pub triggers: mpsc::Receiver<DecryptionTrigger>,
    /// Keyper sets announced on chain, in activation order.
    pub new_keyper_sets: mpsc::UnboundedReceiver<KeyperSet>,
    /// Intake for eon public keys produced by the DKG; each is recorded as
    /// a completed DKG and handed to the publisher.
    pub eon_keys: mpsc::Sender<EonPublicKey>,
    shutdown: Arc<Shutdown>,
    tasks: Vec<JoinHandle<()>>,
}

impl KeyperHandles {
    /// Shut the node down and wait for its tasks to finish.
    pub async fn shutdown(mut self) {
        self.shutdown.trigger();
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
    }
}

impl KeyperNode {
    /// A node against the given chain endpoints, signing slot attestations
    /// with `signing_key`.
    pub fn new(
        config: KeyperConfig,
        client: Arc<dyn ExecutionClient>,
        keyper_set_contract: Arc<dyn KeyperSetContract>,
        eon_key_publish_contract: Arc<dyn EonKeyPublishContract>,
        signing_key: SigningKey,
    ) -> Self {
        Self {
            config,
            client,
            keyper_set_contract,
            eon_key_publish_contract,
            signing_key,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the wall clock, for tests running under paused time.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Start all subsystem tasks and hand out the core-facing channels.
    pub async fn start(self) -> Result<KeyperHandles> {
        let store = Arc::new(MemoryKeyperStore::new());
        let cache = Arc::new(MemoryChainCache::new(self.config.follower().max_cache_size));

        let (new_sets_tx, new_sets_rx) = mpsc::unbounded_channel();
        let (triggers_tx, triggers_rx) = mpsc::channel(self.config.trigger_channel_capacity);
        let (eon_keys_tx, mut eon_keys_rx) = mpsc::channel(EON_KEY_CHANNEL_CAPACITY);
        let (publish_tx, publish_rx) = mpsc::channel(EON_KEY_CHANNEL_CAPACITY);

        let mut fetcher = Fetcher::new(self.client.clone(), cache);
        fetcher.register_contract_event_handler(Arc::new(SequencerSyncHandler::new(
            self.config.sequencer_sync(),
            store.clone(),
        )));
        fetcher.register_contract_event_handler(Arc::new(KeyperSetAddedHandler::new(
            self.config.keyper_set_manager_address,
            self.keyper_set_contract.clone(),
            store.clone(),
            new_sets_tx,
        )));
        fetcher.register_contract_event_handler(Arc::new(EonKeyBroadcastHandler::new(
            self.config.key_broadcast_address,
            store.clone(),
        )));
        fetcher.register_contract_event_handler(Arc::new(ValidatorRegistryUpdatedHandler::new(
            self.config.validator_registry_address,
            self.config.chain_id,
            store.clone(),
        )));

        let heads = self
            .client
            .subscribe_new_heads()
            .await
            .context("subscribing to new heads")?;

        let (shutdown, _signal) = Shutdown::new();
        let shutdown = Arc::new(shutdown);
        let mut tasks = Vec::new();

        tasks.push(tokio::spawn({
            let signal = shutdown.subscribe();
            async move {
                if let Err(error) = fetcher.run(heads, signal).await {
                    tracing::error!(%error, "Chain follower stopped");
                }
            }
        }));

        let slots =
            SlotTicker::new(self.config.slot_timing, self.clock.clone()).spawn(shutdown.subscribe());
        tasks.push(tokio::spawn(
            SlotScheduler::new(self.config.scheduler(), store.clone()).run(
                slots,
                triggers_tx,
                shutdown.subscribe(),
            ),
        ));

        tasks.push(tokio::spawn({
            let monitor = SyncMonitor::new(self.config.monitor(), store.clone());
            let signal = shutdown.subscribe();
            // Weak, so dropping the handles still tears the node down.
            let shutdown = Arc::downgrade(&shutdown);
            async move {
                if let Err(error) = monitor.run(signal).await {
                    tracing::error!(%error, "Sync stalled, shutting down");
                    if let Some(shutdown) = shutdown.upgrade() {
                        shutdown.trigger();
                    }
                }
            }
        }));

        tasks.push(tokio::spawn(
            EonKeyPublisher::new(
                self.config.publisher(),
                store.clone(),
                self.eon_key_publish_contract.clone(),
            )
            .run(publish_rx, shutdown.subscribe()),
        ));

        // DKG results from the core: remember the completion, then publish.
        tasks.push(tokio::spawn({
            let store = store.clone();
            let mut signal = shutdown.subscribe();
            async move {
                loop {
                    let key: EonPublicKey = tokio::select! {
                        _ = signal.cancelled() => return,
                        key = eon_keys_rx.recv() => match key {
                            Some(key) => key,
                            None => return,
                        },
                    };
                    if let Err(error) = store.mark_dkg_completed(key.eon).await {
                        tracing::warn!(%error, eon = key.eon, "Could not record DKG completion");
                    }
                    if publish_tx.send(key).await.is_err() {
                        return;
                    }
                }
            }
        }));

        let middleware = Arc::new(MessagingMiddleware::new(
            self.config.messaging(),
            self.signing_key,
            store.clone(),
        ));

        tracing::info!(
            instance_id = self.config.instance_id,
            tasks = tasks.len(),
            "Keyper node started"
        );
        Ok(KeyperHandles {
            store,
            middleware,
            triggers: triggers_rx,
            new_keyper_sets: new_sets_rx,
            eon_keys: eon_keys_tx,
            shutdown,
            tasks,
        })
    }
}
