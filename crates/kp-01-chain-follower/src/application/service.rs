//! # Fetcher Service
//!
//! Folds incoming chain heads into a pending segment, resolves the pending
//! segment against the synced cache and dispatches the resulting
//! `(Remove, Append)` updates plus matching contract logs to the registered
//! handlers.

use std::sync::Arc;

use shared_types::{Header, ShutdownSignal};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::algorithms::{extend_left, new_segment_right, update_latest};
use crate::domain::{
    ChainFollowerError, ChainSegment, ChainUpdate, MAX_REQUEST_BLOCK_RANGE,
};
use crate::ports::{ChainCache, ChainUpdateHandler, ContractEventHandler, ExecutionClient};

/// The chain-following service.
///
/// Handlers must be registered before calling [`Fetcher::run`].
pub struct Fetcher {
    client: Arc<dyn ExecutionClient>,
    cache: Arc<dyn ChainCache>,
    contract_handlers: Vec<Arc<dyn ContractEventHandler>>,
    chain_update_handlers: Vec<Arc<dyn ChainUpdateHandler>>,
    pending: Option<ChainSegment>,
}

impl Fetcher {
    /// A fetcher reading from `client` and syncing `cache`.
    pub fn new(client: Arc<dyn ExecutionClient>, cache: Arc<dyn ChainCache>) -> Self {
        Self {
            client,
            cache,
            contract_handlers: Vec::new(),
            chain_update_handlers: Vec::new(),
            pending: None,
        }
    }

    /// Register a contract-event handler.
    pub fn register_contract_event_handler(&mut self, handler: Arc<dyn ContractEventHandler>) {
        self.contract_handlers.push(handler);
    }

    /// Register a chain-update handler. These run after the contract-event
    /// handlers for each update.
    pub fn register_chain_update_handler(&mut self, handler: Arc<dyn ChainUpdateHandler>) {
        self.chain_update_handlers.push(handler);
    }

    /// Run until shutdown, the head stream closes, or a fatal error.
    pub async fn run(
        mut self,
        mut heads: mpsc::UnboundedReceiver<Header>,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), ChainFollowerError> {
        if self.pending.is_none() {
            let latest = self.client.latest_header().await?;
            self.pending = Some(ChainSegment::single(latest));
        }
        // Coalescing trigger: at most one processing pass queued at a time.
        let (trigger_tx, mut trigger_rx) = mpsc::channel::<()>(1);
        let _ = trigger_tx.try_send(());
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                head = heads.recv() => {
                    let Some(header) = head else {
                        debug!("head stream closed, exiting fetcher loop");
                        return Ok(());
                    };
                    debug!(block_number = header.number, "new chain head");
                    self.absorb_head(header).await;
                    let _ = trigger_tx.try_send(());
                }
                Some(()) = trigger_rx.recv() => {
                    match self.process_pending().await {
                        Ok(true) => {}
                        Ok(false) => {
                            // Not fully synced yet, keep processing without
                            // waiting for new heads.
                            let _ = trigger_tx.try_send(());
                        }
                        Err(err) if err.is_fatal() => return Err(err),
                        Err(err) => {
                            error!(error = %err, "processing pass failed");
                            let _ = trigger_tx.try_send(());
                        }
                    }
                }
            }
        }
    }

    /// Fold a new head into the pending buffer of unprocessed blocks.
    pub async fn absorb_head(&mut self, header: Header) {
        let segment = ChainSegment::single(header);
        let Some(pending) = self.pending.take() else {
            self.pending = Some(segment);
            return;
        };
        match update_latest(&pending, self.client.as_ref(), segment.clone()).await {
            Ok(result) => {
                if result.removed.is_some() {
                    info!(
                        block_number = segment.latest().number,
                        "new head reorged the pending segment"
                    );
                }
                self.pending = Some(result.full);
            }
            Err(ChainFollowerError::UpdateTooFarInPast { .. }) => {
                // Reorg reaching beyond the pending buffer: start over from
                // the new head.
                self.pending = Some(segment);
            }
            Err(err) => {
                error!(error = %err, "failed to fold head into pending segment");
                self.pending = Some(pending);
            }
        }
    }

    /// One processing pass. Returns `Ok(true)` once the pending buffer is
    /// fully applied; `Ok(false)` means progress was made but another pass
    /// is needed.
    pub async fn process_pending(&mut self) -> Result<bool, ChainFollowerError> {
        let Some(pending) = self.pending.clone() else {
            return Ok(true);
        };
        let (update, success, clear_pending) = match self.cache.get().await? {
            None => {
                // First pass: nothing to compare against, absorb the whole
                // pending segment.
                let update = ChainUpdate {
                    remove: None,
                    append: pending,
                };
                (update, true, true)
            }
            Some(synced) => {
                if pending.earliest().number > synced.latest().number + 1 {
                    // The pending update is ahead of the synced chain; fetch
                    // the gap blocks right of the synced segment first.
                    let gap = pending.earliest().number - synced.latest().number - 1;
                    let query_blocks = gap.min(MAX_REQUEST_BLOCK_RANGE);
                    debug!(
                        synced_latest = synced.latest().number,
                        pending_earliest = pending.earliest().number,
                        query_blocks,
                        "pending segment ahead of synced chain, fetching gap blocks"
                    );
                    match new_segment_right(&synced, self.client.as_ref(), query_blocks).await {
                        Ok(append) => {
                            let update = ChainUpdate {
                                remove: None,
                                append,
                            };
                            (update, false, false)
                        }
                        Err(ChainFollowerError::Reorg) => {
                            // The gap blocks come from a different branch;
                            // backtrack the pending segment and try again.
                            let mut pending = pending;
                            extend_left(&mut pending, self.client.as_ref(), query_blocks)
                                .await?;
                            self.pending = Some(pending);
                            return Ok(false);
                        }
                        Err(err) => return Err(err),
                    }
                } else {
                    let result =
                        update_latest(&synced, self.client.as_ref(), pending).await?;
                    let Some(updated) = result.updated else {
                        // The pending blocks were already part of the synced
                        // chain.
                        self.pending = None;
                        return Ok(true);
                    };
                    let update = ChainUpdate {
                        remove: result.removed,
                        append: updated,
                    };
                    (update, true, true)
                }
            }
        };

        match self.fetch_and_handle(&update).await {
            Ok(()) => {}
            Err(ChainFollowerError::ServerStateInconsistent) => {
                // Raced against a reorg on the server; refresh the head and
                // retry the pass with the pending buffer intact.
                warn!("server state inconsistent, refreshing head and retrying");
                let latest = self.client.latest_header().await?;
                self.absorb_head(latest).await;
                return Ok(false);
            }
            Err(err) => return Err(err),
        }
        self.cache.update(&update).await?;
        if clear_pending {
            self.pending = None;
        }
        Ok(success)
    }

    /// Fetch the logs for an Append segment and dispatch the update to all
    /// handlers: contract-event handlers first, chain-update handlers after.
    async fn fetch_and_handle(&self, update: &ChainUpdate) -> Result<(), ChainFollowerError> {
        let append = &update.append;
        let logs = if self.contract_handlers.is_empty() {
            Vec::new()
        } else {
            let addresses: Vec<_> = self.contract_handlers.iter().map(|h| h.address()).collect();
            let topics: Vec<_> = self.contract_handlers.iter().map(|h| h.topic()).collect();
            self.client
                .logs_in_range(
                    append.earliest().number,
                    append.latest().number,
                    &addresses,
                    &topics,
                )
                .await?
        };
        // Logs can only be filtered by number; a log whose block hash is not
        // part of the Append segment means the server is on a different
        // chain state.
        for log in &logs {
            if append.header_by_hash(&log.block_hash).is_none() {
                return Err(ChainFollowerError::ServerStateInconsistent);
            }
        }

        let mut failures = Vec::new();
        for handler in &self.contract_handlers {
            if let Err(err) = self.dispatch_contract_events(handler.as_ref(), update, &logs).await
            {
                if err.is_fatal() {
                    return Err(err);
                }
                error!(error = %err, "contract event handler failed");
                failures.push(err);
            }
        }
        for handler in &self.chain_update_handlers {
            if let Err(err) = handler.handle(update).await {
                if err.is_fatal() {
                    return Err(err);
                }
                error!(error = %err, "chain update handler failed");
                failures.push(err);
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ChainFollowerError::Handler(format!(
                "{} handler(s) failed for update ending at block {}",
                failures.len(),
                append.latest().number
            )))
        }
    }

    async fn dispatch_contract_events(
        &self,
        handler: &dyn ContractEventHandler,
        update: &ChainUpdate,
        logs: &[shared_types::Log],
    ) -> Result<(), ChainFollowerError> {
        let address = handler.address();
        let topic = handler.topic();
        let mut accepted = Vec::new();
        for log in logs {
            if !log.matches(&address, &topic) {
                continue;
            }
            let event = match handler.parse(log) {
                Ok(event) => event,
                Err(err) => {
                    warn!(error = %err, block_number = log.block_number, "failed to decode contract log");
                    continue;
                }
            };
            let Some(header) = update.append.header_by_hash(&log.block_hash) else {
                return Err(ChainFollowerError::ServerStateInconsistent);
            };
            match handler.accept(header, &event).await {
                Ok(true) => accepted.push(event),
                Ok(false) => {}
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    warn!(error = %err, "accept predicate failed, skipping event");
                }
            }
        }
        handler.handle(update, &accepted).await
    }
}
