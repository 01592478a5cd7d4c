//! # KP-02 Keyper Store
//!
//! Logical persistence for the keyper node.
//!
//! ## Purpose
//!
//! One home for every piece of state the pipeline reads and writes:
//! - The `TransactionSubmitted` event stream with per-eon contiguous
//!   indices and its sync cursor
//! - Tx pointers, current decryption triggers and slot signatures
//! - Keyper sets, eons, eon keys and DKG completion
//! - Validator registrations
//!
//! The store is expressed as trait ports so a SQL backend can slot in; the
//! crate ships [`MemoryKeyperStore`], which serialises every multi-row
//! update under a single lock the way a transactional backend would.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::MemoryKeyperStore;
pub use domain::{
    CurrentDecryptionTrigger, SlotDecryptionSignature, StoreError, StoredTransaction,
    SubmittedTransaction, SyncedUntil, TxPointer, ValidatorRegistration,
};
pub use ports::{
    DecryptionTriggerStore, EonStore, KeyperSetStore, SlotSignatureStore,
    TransactionSubmittedStore, TxPointerStore, ValidatorRegistryStore,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
