//! Outbound ports.

pub mod outbound;

pub use outbound::{KeyperSetContract, KeyperSetData, MockKeyperSetContract};
