//! # Monitor Errors

use thiserror::Error;

/// Fatal monitoring faults. Returned at most once; the owning task
/// terminates the process.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The synced block number did not increase between two consecutive
    /// checks while the keyper was operational.
    #[error("Synced block number stuck at {block} for a full check interval")]
    BlockNotIncreasing {
        /// The block number observed on both samples.
        block: u64,
    },
}
