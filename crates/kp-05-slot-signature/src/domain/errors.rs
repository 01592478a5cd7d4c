//! # Signature Errors

use thiserror::Error;

/// Signing and verification failures.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// The preimage list exceeds the SSZ list bound.
    #[error("Too many identity preimages: {0}")]
    TooManyPreimages(usize),

    /// A signature was not 65 bytes or carried an invalid recovery id.
    #[error("Malformed signature: {0}")]
    MalformedSignature(String),

    /// The underlying ECDSA operation failed.
    #[error("ECDSA failure: {0}")]
    Ecdsa(String),
}
