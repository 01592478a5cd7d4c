//! Hashing algorithms.

pub mod ssz;

pub use ssz::{chunk_u64, hash_preimage_leaf, merkleize, mix_in_length};
