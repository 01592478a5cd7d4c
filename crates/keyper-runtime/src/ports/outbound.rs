//! # Keyper Set Contract Port
//!
//! Read access to the keyper-set manager and the per-set contracts it
//! points at. Reads are pinned to a block hash so a `KeyperSetAdded` event
//! is always resolved against the exact block that emitted it, reorg or
//! not.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{Address, Hash};

use crate::errors::RuntimeError;

/// The on-chain description of one keyper set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyperSetData {
    /// Configuration index the manager assigned to this set; doubles as
    /// the eon number.
    pub index: u64,
    /// Member addresses in contract order.
    pub members: Vec<Address>,
    /// Signature threshold of the set.
    pub threshold: u32,
    /// Whether the set contract has been finalized.
    pub is_finalized: bool,
}

/// The keyper-set manager plus the per-set contracts, as one read surface.
#[async_trait]
pub trait KeyperSetContract: Send + Sync {
    /// The set behind `set_contract`, read at `block_hash`.
    async fn keyper_set(
        &self,
        set_contract: Address,
        block_hash: Hash,
    ) -> Result<KeyperSetData, RuntimeError>;
}

#[derive(Default)]
struct MockContractState {
    sets: HashMap<Address, KeyperSetData>,
    should_fail: bool,
}

/// Programmable in-memory keyper-set contract for tests.
#[derive(Default)]
pub struct MockKeyperSetContract {
    state: Mutex<MockContractState>,
}

impl MockKeyperSetContract {
    /// A contract with no registered sets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a set contract.
    pub fn register(&self, set_contract: Address, data: KeyperSetData) {
        self.state.lock().sets.insert(set_contract, data);
    }

    /// Make every read fail with a contract error.
    pub fn set_failing(&self, should_fail: bool) {
        self.state.lock().should_fail = should_fail;
    }
}

#[async_trait]
impl KeyperSetContract for MockKeyperSetContract {
    async fn keyper_set(
        &self,
        set_contract: Address,
        _block_hash: Hash,
    ) -> Result<KeyperSetData, RuntimeError> {
        let state = self.state.lock();
        if state.should_fail {
            return Err(RuntimeError::Contract("mock failure".into()));
        }
        state
            .sets
            .get(&set_contract)
            .cloned()
            .ok_or_else(|| RuntimeError::Contract("unknown keyper set contract".into()))
    }
}
