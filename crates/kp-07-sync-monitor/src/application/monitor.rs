//! # Sync Monitor
//!
//! Samples the sequencer sync cursor on a fixed interval. Reorgs may lower
//! the number within a sample, but between two samples it must have grown;
//! otherwise the sync pipeline is stuck and the process should die loudly
//! rather than miss slots quietly.

use std::sync::Arc;

use kp_02_keyper_store::{EonStore, TransactionSubmittedStore};
use shared_types::ShutdownSignal;

use crate::config::MonitorConfig;
use crate::domain::MonitorError;

/// The store surface the monitor needs.
pub trait MonitorStore: TransactionSubmittedStore + EonStore {}

impl<T> MonitorStore for T where T: TransactionSubmittedStore + EonStore {}

/// Periodic sync progress watchdog.
pub struct SyncMonitor {
    config: MonitorConfig,
    store: Arc<dyn MonitorStore>,
    last_seen: Option<u64>,
}

impl SyncMonitor {
    /// A monitor reading from the given store.
    pub fn new(config: MonitorConfig, store: Arc<dyn MonitorStore>) -> Self {
        Self {
            config,
            store,
            last_seen: None,
        }
    }

    /// Run until shutdown or a fatal stall. The returned error is produced
    /// at most once.
    pub async fn run(mut self, mut shutdown: ShutdownSignal) -> Result<(), MonitorError> {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                _ = tokio::time::sleep(self.config.check_interval()) => {}
            }
            self.check().await?;
        }
    }

    /// One monitoring pass. Store failures and bootstrap states only log;
    /// the sole error is the fatal stall.
    pub async fn check(&mut self) -> Result<(), MonitorError> {
        match self.operational().await {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!("Keyper still bootstrapping, sync monitor inactive");
                self.last_seen = None;
                return Ok(());
            }
            Err(error) => {
                tracing::warn!(%error, "Sync monitor could not read eon state");
                return Ok(());
            }
        }

        let synced = match self.store.synced_until().await {
            Ok(synced) => synced,
            Err(error) => {
                tracing::warn!(%error, "Sync monitor could not read the sync cursor");
                return Ok(());
            }
        };
        let Some(synced) = synced else {
            tracing::warn!("No block synced yet");
            return Ok(());
        };

        match self.last_seen {
            Some(previous) if synced.block_number <= previous => {
                Err(MonitorError::BlockNotIncreasing {
                    block: synced.block_number,
                })
            }
            _ => {
                tracing::debug!(block = synced.block_number, "Sync progressing");
                self.last_seen = Some(synced.block_number);
                Ok(())
            }
        }
    }

    /// Operational means at least one eon exists and the latest one's DKG
    /// has produced a result.
    async fn operational(&self) -> Result<bool, kp_02_keyper_store::StoreError> {
        let eons = self.store.all_eons().await?;
        let Some(latest) = eons.last() else {
            return Ok(false);
        };
        self.store.dkg_completed(latest.eon).await
    }
}
