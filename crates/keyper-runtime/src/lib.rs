//! # Keyper Runtime
//!
//! Assembles the keyper node from the subsystem crates.
//!
//! ## Purpose
//!
//! Everything that is wiring rather than pipeline logic lives here:
//! - The aggregate [`KeyperConfig`] projected onto each crate's config
//! - Contract-event handlers for keyper sets, eon key broadcasts and
//!   validator registrations
//! - The [`KeyperNode`] builder spawning all tasks under one shutdown
//!   handle and exposing the channels the key-generation core plugs into
//!
//! ## Module Structure
//!
//! ```text
//! keyper-runtime/
//! ├── config.rs        # KeyperConfig and its per-subsystem projections
//! ├── errors.rs        # RuntimeError
//! ├── handlers/        # KeyperSetAdded, EonKeyBroadcast, registry Updated
//! ├── ports/           # Keyper set contract reads (outbound)
//! └── runtime.rs       # KeyperNode, KeyperHandles, tracing setup
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod errors;
pub mod handlers;
pub mod ports;
pub mod runtime;

// Re-exports
pub use config::KeyperConfig;
pub use errors::RuntimeError;
pub use handlers::{
    EonKeyBroadcastHandler, KeyperSetAddedHandler, RegistrationMessage,
    ValidatorRegistryUpdatedHandler,
};
pub use ports::{KeyperSetContract, KeyperSetData, MockKeyperSetContract};
pub use runtime::{init_tracing, KeyperHandles, KeyperNode};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
