//! # KP-01 Chain Follower
//!
//! The single asynchronous source of truth for "what happened on chain".
//!
//! ## Purpose
//!
//! Follow the execution chain through reorgs and deliver `(Remove, Append)`
//! segment pairs plus decoded contract events to registered handlers, exactly
//! once per canonical block:
//! - Contiguous header segments with reorg-aware splice operations
//! - A bounded cache of the canonical tail, enough to absorb reorgs
//! - A fetcher that folds incoming heads into a pending buffer, resolves it
//!   against the cache and dispatches matching logs
//!
//! ## Module Structure
//!
//! ```text
//! kp-01-chain-follower/
//! ├── domain/          # ChainSegment, ChainUpdate, contract events, errors
//! ├── algorithms/      # Client-assisted segment splicing (update_latest)
//! ├── ports/           # Handler traits (inbound) + execution client (outbound)
//! ├── adapters/        # In-memory chain cache
//! ├── application/     # The Fetcher service
//! └── config.rs        # FollowerConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod testing;

// Re-exports
pub use adapters::MemoryChainCache;
pub use algorithms::{extend_left, new_segment_right, update_latest, UpdateLatestResult};
pub use application::Fetcher;
pub use config::FollowerConfig;
pub use domain::{
    ChainFollowerError, ChainSegment, ChainUpdate, ContractEvent, EonKeyBroadcastEvent,
    KeyperSetAddedEvent, TransactionSubmittedEvent, ValidatorRegistryUpdatedEvent,
    MAX_POLL_BLOCKS, MAX_REQUEST_BLOCK_RANGE,
};
pub use ports::{ChainCache, ChainUpdateHandler, ContractEventHandler, ExecutionClient, MockExecutionClient};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
