//! # Keyper Test Suite
//!
//! Cross-crate integration tests for the keyper node.
//!
//! ```text
//! tests/src/integration/
//! ├── reorg.rs      # Fetcher + sequencer sync through reorgs
//! └── pipeline.rs   # Submissions -> trigger -> shares -> validated keys
//! ```
//!
//! Run with `cargo test -p keyper-tests`.

pub mod integration;
