//! # Eon Key Publish Contract Port
//!
//! The view and transaction surface of the on-chain eon-key-publish
//! contract, plus a programmable mock for tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{Address, Hash};

use crate::domain::PublisherError;

/// Receipt of a mined transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxReceipt {
    /// Hash of the mined transaction.
    pub tx_hash: Hash,
    /// Block the transaction was included in.
    pub block_number: u64,
    /// Whether the transaction succeeded.
    pub success: bool,
}

/// The eon-key-publish contract.
#[async_trait]
pub trait EonKeyPublishContract: Send + Sync {
    /// Whether `keyper` has already voted for the current eon key.
    async fn has_keyper_voted(&self, keyper: &Address) -> Result<bool, PublisherError>;

    /// Whether `key` has already gathered enough votes to be confirmed.
    async fn eon_key_confirmed(&self, key: &[u8]) -> Result<bool, PublisherError>;

    /// Submit a publish-eon-key transaction, returning its hash.
    async fn publish_eon_key(&self, key: &[u8], keyper_index: u64)
        -> Result<Hash, PublisherError>;

    /// Wait until the transaction is mined.
    async fn wait_mined(&self, tx_hash: Hash) -> Result<TxReceipt, PublisherError>;
}

#[derive(Default)]
struct MockContractState {
    voted: Vec<Address>,
    confirmed: Vec<Vec<u8>>,
    published: Vec<(Vec<u8>, u64)>,
    failures_remaining: u32,
    revert_next: bool,
    next_tx: u64,
}

/// Programmable in-memory contract for tests.
#[derive(Default)]
pub struct MockEonKeyPublishContract {
    state: Mutex<MockContractState>,
}

impl MockEonKeyPublishContract {
    /// An empty contract: nobody voted, nothing confirmed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a keyper as having voted.
    pub fn set_voted(&self, keyper: Address) {
        self.state.lock().voted.push(keyper);
    }

    /// Mark a key as confirmed.
    pub fn set_confirmed(&self, key: Vec<u8>) {
        self.state.lock().confirmed.push(key);
    }

    /// Make the next `n` contract interactions fail.
    pub fn fail_next(&self, n: u32) {
        self.state.lock().failures_remaining = n;
    }

    /// Make the next publish transaction revert.
    pub fn revert_next(&self) {
        self.state.lock().revert_next = true;
    }

    /// The `(key, keyper_index)` pairs published so far.
    pub fn published(&self) -> Vec<(Vec<u8>, u64)> {
        self.state.lock().published.clone()
    }

    fn check_failure(&self) -> Result<(), PublisherError> {
        let mut state = self.state.lock();
        if state.failures_remaining > 0 {
            state.failures_remaining -= 1;
            return Err(PublisherError::Contract("injected failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl EonKeyPublishContract for MockEonKeyPublishContract {
    async fn has_keyper_voted(&self, keyper: &Address) -> Result<bool, PublisherError> {
        self.check_failure()?;
        Ok(self.state.lock().voted.contains(keyper))
    }

    async fn eon_key_confirmed(&self, key: &[u8]) -> Result<bool, PublisherError> {
        self.check_failure()?;
        Ok(self.state.lock().confirmed.iter().any(|k| k == key))
    }

    async fn publish_eon_key(
        &self,
        key: &[u8],
        keyper_index: u64,
    ) -> Result<Hash, PublisherError> {
        self.check_failure()?;
        let mut state = self.state.lock();
        state.published.push((key.to_vec(), keyper_index));
        state.next_tx += 1;
        let mut tx_hash = [0u8; 32];
        tx_hash[24..].copy_from_slice(&state.next_tx.to_be_bytes());
        Ok(tx_hash)
    }

    async fn wait_mined(&self, tx_hash: Hash) -> Result<TxReceipt, PublisherError> {
        let mut state = self.state.lock();
        let success = !state.revert_next;
        state.revert_next = false;
        Ok(TxReceipt {
            tx_hash,
            block_number: 1,
            success,
        })
    }
}
