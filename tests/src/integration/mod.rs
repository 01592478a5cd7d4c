//! Cross-subsystem integration tests.

pub mod pipeline;
pub mod reorg;
