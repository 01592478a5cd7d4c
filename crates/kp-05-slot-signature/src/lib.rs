//! # KP-05 Slot Signature
//!
//! Keyper attestations of released decryption keys.
//!
//! ## Purpose
//!
//! Keypers attest the `(eon, slot, txPointer, identityPreimages)` they
//! released a decryption key for:
//! - A deterministic SSZ hash tree root over the attestation content,
//!   byte-compatible with the reference consensus-layer hashing
//! - Recoverable secp256k1 ECDSA signatures over that root, verified by
//!   public-key recovery and address comparison
//!
//! ## Module Structure
//!
//! ```text
//! kp-05-slot-signature/
//! ├── algorithms/      # SSZ merkleization
//! └── domain/          # SlotDecryptionSignatureData, sign/verify, errors
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithms;
pub mod domain;

// Re-exports
pub use domain::{SignatureError, SlotDecryptionSignatureData, MAX_NUM_PREIMAGES};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
