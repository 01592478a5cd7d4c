//! # Messaging Errors

use kp_02_keyper_store::StoreError;
use kp_05_slot_signature::SignatureError;
use thiserror::Error;

/// Middleware failures. Message drops are not errors; they are `Ok(None)`
/// outcomes logged where they happen.
#[derive(Debug, Error)]
pub enum MessagingError {
    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Signing or hashing the attestation content failed.
    #[error(transparent)]
    Signature(#[from] SignatureError),

    /// No block has been synced yet, so there is no pointer context.
    #[error("No synced block yet")]
    NoSyncedBlock,

    /// A wire payload could not be decoded.
    #[error("Malformed wire message: {0}")]
    Decode(String),
}
