//! # Core Entities
//!
//! Chain primitives and keyper-set domain types.

use serde::{Deserialize, Serialize};

use crate::identity_preimage::IdentityPreimage;

/// 32-byte hash (block hashes, topics, identities hashes).
pub type Hash = [u8; 32];

/// 20-byte account address.
pub type Address = [u8; 20];

/// An execution-chain block header.
///
/// Immutable once observed; the chain cache owns the canonical copies and
/// handlers only ever borrow them for the duration of a call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Block hash.
    pub hash: Hash,
    /// Hash of the parent block.
    pub parent_hash: Hash,
    /// Block number.
    pub number: u64,
    /// Block timestamp (seconds since unix epoch).
    pub timestamp: u64,
}

impl Header {
    /// Whether `child` directly extends this header.
    pub fn is_parent_of(&self, child: &Header) -> bool {
        child.parent_hash == self.hash && child.number == self.number + 1
    }
}

/// A contract log as returned by the execution node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    /// Emitting contract address.
    pub address: Address,
    /// Log topics; `topics[0]` is the event signature.
    pub topics: Vec<Hash>,
    /// ABI-encoded event data.
    pub data: Vec<u8>,
    /// Hash of the block containing the log.
    pub block_hash: Hash,
    /// Number of the block containing the log.
    pub block_number: u64,
    /// Index of the transaction within the block.
    pub tx_index: u64,
    /// Index of the log within the block.
    pub log_index: u64,
}

impl Log {
    /// Whether the log matches a contract address and event topic.
    pub fn matches(&self, address: &Address, topic: &Hash) -> bool {
        self.address == *address && self.topics.first() == Some(topic)
    }
}

/// An ordered keyper committee with a reconstruction threshold.
///
/// Insert-only: once observed on chain a set is never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyperSet {
    /// Index of the keyper-set configuration; doubles as the eon number.
    pub keyper_config_index: u64,
    /// First block at which this set is active.
    pub activation_block_number: u64,
    /// Ordered member addresses. Unique.
    pub members: Vec<Address>,
    /// Number of shares needed to reconstruct a decryption key.
    pub threshold: u32,
}

impl KeyperSet {
    /// Whether `address` is a member of this set.
    pub fn contains(&self, address: &Address) -> bool {
        self.members.contains(address)
    }

    /// Position of `address` within the ordered members, if present.
    pub fn index_of(&self, address: &Address) -> Option<u64> {
        self.members
            .iter()
            .position(|m| m == address)
            .map(|i| i as u64)
    }

    /// Members at the given indices, failing on any out-of-range index.
    pub fn subset(&self, indices: &[u64]) -> Option<Vec<Address>> {
        indices
            .iter()
            .map(|&i| self.members.get(i as usize).copied())
            .collect()
    }
}

/// An epoch of the threshold key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eon {
    /// Eon number (== keyper-set configuration index).
    pub eon: u64,
    /// First block at which this eon is active.
    pub activation_block_number: u64,
}

/// An eon public key as derived by the external DKG.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EonPublicKey {
    /// Eon this key belongs to.
    pub eon: u64,
    /// Opaque serialized public key.
    pub public_key: Vec<u8>,
}

/// Instruction to the keyper core to produce decryption key shares for a set
/// of identity preimages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecryptionTrigger {
    /// Latest synced block number at trigger time.
    pub block_number: u64,
    /// Ordered identity preimages to decrypt.
    pub identity_preimages: Vec<IdentityPreimage>,
}
