//! Outbound ports.

pub mod outbound;

pub use outbound::{EonKeyPublishContract, MockEonKeyPublishContract, TxReceipt};
