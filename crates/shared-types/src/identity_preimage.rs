//! # Identity Preimages
//!
//! The 52-byte inputs from which per-transaction and per-slot identities are
//! derived for threshold encryption.

use serde::{Deserialize, Serialize};

use crate::crypto::keccak256;
use crate::entities::{Address, Hash};

/// Length of an identity preimage: 32-byte prefix plus 20-byte sender.
pub const IDENTITY_PREIMAGE_LEN: usize = 52;

/// An identity preimage.
///
/// Transaction identities are `identityPrefix ‖ sender`. The slot identity is
/// 32 zero bytes followed by the big-endian slot number, left-padded to 20
/// bytes. The leading zeros guarantee the slot preimage sorts before every
/// transaction preimage, since sender addresses cannot be that small.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IdentityPreimage(Vec<u8>);

impl IdentityPreimage {
    /// Wrap raw bytes as an identity preimage.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Preimage for a submitted transaction: `identityPrefix ‖ sender`.
    pub fn from_prefix_and_sender(prefix: &[u8; 32], sender: &Address) -> Self {
        let mut bytes = Vec::with_capacity(IDENTITY_PREIMAGE_LEN);
        bytes.extend_from_slice(prefix);
        bytes.extend_from_slice(sender);
        Self(bytes)
    }

    /// Preimage for a slot identity: 32 zero bytes plus the slot number as a
    /// 20-byte big-endian integer.
    pub fn from_slot(slot: u64) -> Self {
        let mut bytes = vec![0u8; IDENTITY_PREIMAGE_LEN];
        bytes[IDENTITY_PREIMAGE_LEN - 8..].copy_from_slice(&slot.to_be_bytes());
        Self(bytes)
    }

    /// Raw bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the preimage is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sort preimages lexicographically, returning a new vector.
    pub fn sorted(preimages: &[IdentityPreimage]) -> Vec<IdentityPreimage> {
        let mut sorted = preimages.to_vec();
        sorted.sort();
        sorted
    }
}

/// keccak256 over the concatenated preimage bytes in the given order. This
/// is the identities hash recorded with a decryption trigger and checked
/// against inbound share messages.
pub fn hash_identities(preimages: &[IdentityPreimage]) -> Hash {
    let mut concatenated = Vec::with_capacity(preimages.len() * IDENTITY_PREIMAGE_LEN);
    for preimage in preimages {
        concatenated.extend_from_slice(preimage.bytes());
    }
    keccak256(&concatenated)
}
