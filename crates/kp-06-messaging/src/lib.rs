//! # KP-06 Messaging
//!
//! Slot-aware messaging between the keyper core and the P2P substrate.
//!
//! ## Purpose
//!
//! The keyper core produces bare share and key messages; the network
//! expects them bound to a slot. This crate sits in between:
//! - Outgoing `DecryptionKeyShares` get the recorded trigger's slot and tx
//!   pointer plus this keyper's slot signature
//! - Outgoing `DecryptionKeys` get the collected threshold signatures and
//!   advance the tx pointer
//! - Inbound messages are validated against the configured instance, the
//!   active keyper set and the recorded trigger before handoff
//!
//! ## Module Structure
//!
//! ```text
//! kp-06-messaging/
//! ├── domain/          # Wire messages, ValidationOutcome, errors
//! ├── application/     # MessagingMiddleware, inbound validators
//! └── config.rs        # MessagingConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod application;
pub mod config;
pub mod domain;

// Re-exports
pub use application::{MessagingMiddleware, MiddlewareStore};
pub use config::MessagingConfig;
pub use domain::{
    DecryptionKey, DecryptionKeyShares, DecryptionKeys, KeyShare, KeysExtra, MessagingError,
    SharesExtra, ValidationOutcome,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
