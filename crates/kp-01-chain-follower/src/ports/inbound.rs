//! # Inbound Ports
//!
//! Handler traits the fetcher dispatches to. Contract-event handlers run
//! first for each update, chain-update handlers after.

use async_trait::async_trait;
use shared_types::{Address, Hash, Header};

use crate::domain::{ChainFollowerError, ChainUpdate, ContractEvent};

/// A typed contract-event handler.
///
/// `handle` must be idempotent under re-delivery of identical updates: an
/// update whose handler batch fails is not committed to the cache and will
/// be delivered again.
#[async_trait]
pub trait ContractEventHandler: Send + Sync {
    /// Contract address this handler listens to.
    fn address(&self) -> Address;

    /// Event signature topic this handler listens to.
    fn topic(&self) -> Hash;

    /// ABI-decode a matching log.
    fn parse(&self, log: &shared_types::Log) -> Result<ContractEvent, ChainFollowerError>;

    /// Cheap predicate deciding whether a decoded event enters the batch.
    /// Non-fatal errors skip the event.
    async fn accept(
        &self,
        header: &Header,
        event: &ContractEvent,
    ) -> Result<bool, ChainFollowerError>;

    /// Process the accepted events of one chain update as a batch.
    async fn handle(
        &self,
        update: &ChainUpdate,
        events: &[ContractEvent],
    ) -> Result<(), ChainFollowerError>;
}

/// A handler interested in chain updates only, without an event filter.
/// Runs after all contract-event handlers for the same update.
#[async_trait]
pub trait ChainUpdateHandler: Send + Sync {
    /// Process one chain update.
    async fn handle(&self, update: &ChainUpdate) -> Result<(), ChainFollowerError>;
}
