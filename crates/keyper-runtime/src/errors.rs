//! # Runtime Errors

use kp_01_chain_follower::ChainFollowerError;
use kp_02_keyper_store::StoreError;
use thiserror::Error;

/// Failures inside the runtime's contract-event handlers. They surface as
/// handler errors to the chain follower, which redelivers the update.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A contract read failed.
    #[error("Contract call failed: {0}")]
    Contract(String),

    /// A validator registration message could not be decoded.
    #[error("Malformed registration message: {0}")]
    MalformedRegistration(String),

    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<RuntimeError> for ChainFollowerError {
    fn from(error: RuntimeError) -> Self {
        ChainFollowerError::Handler(error.to_string())
    }
}
