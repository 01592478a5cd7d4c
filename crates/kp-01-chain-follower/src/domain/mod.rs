//! Domain types for the chain follower.

pub mod entities;
pub mod errors;
pub mod events;

pub use entities::{ChainSegment, ChainUpdate, MAX_POLL_BLOCKS, MAX_REQUEST_BLOCK_RANGE};
pub use errors::ChainFollowerError;
pub use events::{
    ContractEvent, EonKeyBroadcastEvent, KeyperSetAddedEvent, TransactionSubmittedEvent,
    ValidatorRegistryUpdatedEvent,
};
