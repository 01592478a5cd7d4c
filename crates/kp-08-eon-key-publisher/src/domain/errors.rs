//! # Publisher Errors

use kp_02_keyper_store::StoreError;
use thiserror::Error;

/// Publish failures. All variants are transient and retried on the fixed
/// interval.
#[derive(Debug, Error)]
pub enum PublisherError {
    /// A contract call or transaction submission failed.
    #[error("Contract call failed: {0}")]
    Contract(String),

    /// The publish transaction was mined but reverted.
    #[error("Publish transaction for eon {eon} was not successful")]
    ReceiptNotSuccessful {
        /// Eon whose key was being published.
        eon: u64,
    },

    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
