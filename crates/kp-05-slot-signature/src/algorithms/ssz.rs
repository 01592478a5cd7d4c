//! # SSZ Merkleization
//!
//! The subset of SSZ hashing the slot attestation needs. Compatibility
//! matters more than generality here: roots must match the reference
//! implementation byte for byte, which pins down three rules.
//!
//! - `uint64` values are little-endian packed into a 32-byte chunk
//! - each 52-byte identity preimage is right-zero-padded to 64 bytes and
//!   hashed as a single leaf
//! - list roots mix the element count into the merkle root

use sha2::{Digest, Sha256};
use shared_types::Hash;

fn sha256_pair(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// A `uint64` as an SSZ chunk: little-endian in the first 8 bytes.
pub fn chunk_u64(value: u64) -> Hash {
    let mut chunk = [0u8; 32];
    chunk[..8].copy_from_slice(&value.to_le_bytes());
    chunk
}

/// Leaf for one identity preimage: the bytes right-zero-padded to 64 and
/// hashed in one go.
pub fn hash_preimage_leaf(bytes: &[u8]) -> Hash {
    let mut padded = [0u8; 64];
    padded[..bytes.len()].copy_from_slice(bytes);
    let mut hasher = Sha256::new();
    hasher.update(padded);
    hasher.finalize().into()
}

/// Merkleize chunks into a tree padded with zero subtrees to `limit`
/// leaves. `limit` must be a power of two and at least `chunks.len()`.
pub fn merkleize(chunks: &[Hash], limit: usize) -> Hash {
    debug_assert!(limit.is_power_of_two());
    debug_assert!(chunks.len() <= limit);
    let depth = limit.trailing_zeros();

    let mut level: Vec<Hash> = chunks.to_vec();
    let mut zero: Hash = [0u8; 32];
    for _ in 0..depth {
        if level.len() % 2 == 1 {
            level.push(zero);
        }
        level = level
            .chunks(2)
            .map(|pair| sha256_pair(&pair[0], &pair[1]))
            .collect();
        zero = sha256_pair(&zero, &zero);
    }
    level.first().copied().unwrap_or(zero)
}

/// Mix a list's element count into its merkle root.
pub fn mix_in_length(root: &Hash, length: u64) -> Hash {
    sha256_pair(root, &chunk_u64(length))
}
