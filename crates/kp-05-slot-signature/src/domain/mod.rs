//! Domain layer.

pub mod data;
pub mod errors;

pub use data::{SlotDecryptionSignatureData, MAX_NUM_PREIMAGES};
pub use errors::SignatureError;
