//! # Shared Types Crate
//!
//! Domain entities shared across the keyper subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: all cross-subsystem types are defined here.
//! - **Plain data**: no I/O and no storage logic; crates that persist or
//!   transport these types own that concern themselves.

pub mod crypto;
pub mod entities;
pub mod identity_preimage;
pub mod retry;
pub mod shutdown;
pub mod slots;

pub use crypto::{address_from_public_key, keccak256};
pub use entities::{
    Address, DecryptionTrigger, Eon, EonPublicKey, Hash, Header, KeyperSet, Log,
};
pub use identity_preimage::{hash_identities, IdentityPreimage, IDENTITY_PREIMAGE_LEN};
pub use retry::retry_with_interval;
pub use shutdown::{Shutdown, ShutdownSignal};
pub use slots::SlotTiming;

/// Largest unsigned value that still fits a signed 64-bit storage column.
pub const I63_MAX: u64 = i64::MAX as u64;

/// Whether an on-chain `u64` can be stored in a signed 64-bit representation.
pub fn fits_i63(value: u64) -> bool {
    value <= I63_MAX
}
