//! Domain layer.

pub mod errors;
pub mod messages;
pub mod outcome;

pub use errors::MessagingError;
pub use messages::{
    DecryptionKey, DecryptionKeyShares, DecryptionKeys, KeyShare, KeysExtra, SharesExtra,
};
pub use outcome::ValidationOutcome;
