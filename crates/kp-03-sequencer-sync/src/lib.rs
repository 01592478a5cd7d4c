//! # KP-03 Sequencer Sync
//!
//! The `TransactionSubmitted` ingestion path.
//!
//! ## Purpose
//!
//! A contract-event handler for the chain follower that mirrors the
//! sequencer's submission queue into the keyper store:
//! - ABI-decoded `TransactionSubmitted` events become store rows with
//!   contiguous per-eon indices
//! - Reorged-out rows are deleted atomically with the replacing insert
//! - The synced-until cursor tracks the latest fully applied block and its
//!   slot
//!
//! ## Module Structure
//!
//! ```text
//! kp-03-sequencer-sync/
//! ├── application/     # The SequencerSyncHandler
//! └── config.rs        # SequencerSyncConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod application;
pub mod config;

// Re-exports
pub use application::SequencerSyncHandler;
pub use config::SequencerSyncConfig;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
