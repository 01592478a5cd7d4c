//! # Store Errors

use thiserror::Error;

/// Store error types.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend failure (connection loss, transaction abort). Transient;
    /// callers retry or skip the current unit of work.
    #[error("Store backend error: {0}")]
    Backend(String),

    /// A write violated a store invariant and was refused.
    #[error("Store constraint violated: {0}")]
    Constraint(String),
}
