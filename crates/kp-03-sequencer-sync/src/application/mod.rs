//! Application services.

pub mod handler;

pub use handler::SequencerSyncHandler;
