//! # KP-08 Eon Key Publisher
//!
//! On-chain publication of derived eon public keys.
//!
//! ## Purpose
//!
//! When the external DKG delivers an eon public key, exactly one vote per
//! keyper should land on the eon-key-publish contract:
//! - Skip when this node is not in the eon's keyper set, has already
//!   voted, or the key is already confirmed
//! - Retry transient contract failures on a fixed interval
//! - Wait for the mined receipt and treat an unsuccessful one as a
//!   failure to retry
//!
//! ## Module Structure
//!
//! ```text
//! kp-08-eon-key-publisher/
//! ├── domain/          # PublisherError
//! ├── ports/           # EonKeyPublishContract + mock
//! ├── application/     # EonKeyPublisher
//! └── config.rs        # PublisherConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use application::{EonKeyPublisher, PublishOutcome};
pub use config::PublisherConfig;
pub use domain::PublisherError;
pub use ports::{EonKeyPublishContract, MockEonKeyPublishContract, TxReceipt};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
