//! # Domain Errors
//!
//! Error types for chain following and handler dispatch.

use thiserror::Error;

/// Chain follower error types.
#[derive(Debug, Error)]
pub enum ChainFollowerError {
    /// Headers passed to a segment constructor are not contiguous.
    #[error("Invalid chain segment: {0}")]
    InvalidSegment(String),

    /// A segment operation was attempted on an empty segment.
    #[error("Empty chain segment")]
    EmptySegment,

    /// The server's parent-by-number disagrees with the local parent hash:
    /// the server is on a different branch.
    #[error("Detected reorg in updated chain segment")]
    Reorg,

    /// The update segment reaches below the earliest locally known block;
    /// the cache is exhausted and the reorg cannot be replayed.
    #[error("Update reaches too far in the past: segment earliest={segment_earliest}, update earliest={update_earliest}")]
    UpdateTooFarInPast {
        /// Earliest block number of the local segment.
        segment_earliest: u64,
        /// Earliest block number of the update.
        update_earliest: u64,
    },

    /// The server returned a log for a block not present in the Append
    /// segment; the server's chain state differs from the assumed local one.
    #[error("Server chain state differs from assumed local state")]
    ServerStateInconsistent,

    /// Transient execution-client failure (RPC timeout, disconnect).
    #[error("Execution client error: {0}")]
    Client(String),

    /// ABI decoding of a contract log failed.
    #[error("Event decode error: {0}")]
    Decode(String),

    /// One or more handlers failed for an update; the update was not
    /// committed to the cache and will be redelivered.
    #[error("Handler error: {0}")]
    Handler(String),

    /// Fatal condition raised by a handler; terminates the fetcher.
    #[error("Critical handler error: {0}")]
    Critical(String),
}

impl ChainFollowerError {
    /// Whether this error must terminate the fetcher instead of being
    /// logged and retried.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Critical(_) | Self::UpdateTooFarInPast { .. }
        )
    }
}
