//! # Outbound Ports
//!
//! Traits for the execution node and the chain cache, plus a programmable
//! mock execution client capable of reorgs.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{Address, Hash, Header, Log};
use tokio::sync::mpsc;

use crate::domain::{ChainFollowerError, ChainSegment, ChainUpdate};

/// Execution-node JSON-RPC surface the follower consumes.
#[async_trait]
pub trait ExecutionClient: Send + Sync {
    /// The current head of the chain.
    async fn latest_header(&self) -> Result<Header, ChainFollowerError>;

    /// Header of the canonical block at `number`.
    async fn header_by_number(&self, number: u64) -> Result<Header, ChainFollowerError>;

    /// Header with the given hash, if the node knows it.
    async fn header_by_hash(&self, hash: &Hash) -> Result<Option<Header>, ChainFollowerError>;

    /// Logs in the block range `[from, to]` emitted by any of `addresses`
    /// with any of `topics` as their event signature.
    async fn logs_in_range(
        &self,
        from: u64,
        to: u64,
        addresses: &[Address],
        topics: &[Hash],
    ) -> Result<Vec<Log>, ChainFollowerError>;

    /// Subscribe to new chain heads.
    async fn subscribe_new_heads(
        &self,
    ) -> Result<mpsc::UnboundedReceiver<Header>, ChainFollowerError>;
}

/// Bounded tail of canonical headers. `update` is atomic; persistent
/// implementations apply it in a single transaction.
#[async_trait]
pub trait ChainCache: Send + Sync {
    /// The cached segment, or `None` before the first update.
    async fn get(&self) -> Result<Option<ChainSegment>, ChainFollowerError>;

    /// Header by hash from the cached tail.
    async fn header_by_hash(&self, hash: &Hash) -> Result<Option<Header>, ChainFollowerError>;

    /// Apply a `(Remove, Append)` pair.
    async fn update(&self, update: &ChainUpdate) -> Result<(), ChainFollowerError>;
}

// =============================================================================
// Mock Implementation for Testing
// =============================================================================

#[derive(Default)]
struct MockChainState {
    canonical: Vec<Header>,
    logs: Vec<Log>,
    head_subscribers: Vec<mpsc::UnboundedSender<Header>>,
    should_fail: bool,
}

/// Programmable in-memory execution client.
///
/// `push_head` appends a header to the canonical chain and notifies head
/// subscribers; pushing a header at or below the current tip truncates the
/// chain first, which models the server switching to a reorged branch.
#[derive(Clone, Default)]
pub struct MockExecutionClient {
    state: Arc<Mutex<MockChainState>>,
}

impl MockExecutionClient {
    /// A client with an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the canonical chain without notifying subscribers.
    pub fn set_canonical(&self, headers: Vec<Header>) {
        self.state.lock().canonical = headers;
    }

    /// Append a new head, truncating any blocks at or above its number and
    /// dropping their logs, then notify subscribers.
    pub fn push_head(&self, header: Header) {
        let mut state = self.state.lock();
        while state
            .canonical
            .last()
            .is_some_and(|last| last.number >= header.number)
        {
            let removed = state.canonical.pop();
            if let Some(removed) = removed {
                state.logs.retain(|l| l.block_hash != removed.hash);
            }
        }
        state.canonical.push(header.clone());
        state
            .head_subscribers
            .retain(|tx| tx.send(header.clone()).is_ok());
    }

    /// Register a log; its block need not be canonical, which lets tests
    /// provoke the server-state-inconsistent path.
    pub fn add_log(&self, log: Log) {
        self.state.lock().logs.push(log);
    }

    /// Make every request fail with a client error.
    pub fn set_failing(&self, should_fail: bool) {
        self.state.lock().should_fail = should_fail;
    }

    fn check_failing(&self) -> Result<(), ChainFollowerError> {
        if self.state.lock().should_fail {
            return Err(ChainFollowerError::Client("mock failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ExecutionClient for MockExecutionClient {
    async fn latest_header(&self) -> Result<Header, ChainFollowerError> {
        self.check_failing()?;
        self.state
            .lock()
            .canonical
            .last()
            .cloned()
            .ok_or_else(|| ChainFollowerError::Client("no blocks".into()))
    }

    async fn header_by_number(&self, number: u64) -> Result<Header, ChainFollowerError> {
        self.check_failing()?;
        self.state
            .lock()
            .canonical
            .iter()
            .find(|h| h.number == number)
            .cloned()
            .ok_or_else(|| ChainFollowerError::Client(format!("unknown block {number}")))
    }

    async fn header_by_hash(&self, hash: &Hash) -> Result<Option<Header>, ChainFollowerError> {
        self.check_failing()?;
        Ok(self
            .state
            .lock()
            .canonical
            .iter()
            .find(|h| &h.hash == hash)
            .cloned())
    }

    async fn logs_in_range(
        &self,
        from: u64,
        to: u64,
        addresses: &[Address],
        topics: &[Hash],
    ) -> Result<Vec<Log>, ChainFollowerError> {
        self.check_failing()?;
        Ok(self
            .state
            .lock()
            .logs
            .iter()
            .filter(|l| l.block_number >= from && l.block_number <= to)
            .filter(|l| addresses.contains(&l.address))
            .filter(|l| l.topics.first().is_some_and(|t| topics.contains(t)))
            .cloned()
            .collect())
    }

    async fn subscribe_new_heads(
        &self,
    ) -> Result<mpsc::UnboundedReceiver<Header>, ChainFollowerError> {
        self.check_failing()?;
        let (tx, rx) = mpsc::unbounded_channel();
        self.state.lock().head_subscribers.push(tx);
        Ok(rx)
    }
}
