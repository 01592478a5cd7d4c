//! Client-assisted segment algorithms.

pub mod segment_sync;

pub use segment_sync::{extend_left, new_segment_right, update_latest, UpdateLatestResult};
