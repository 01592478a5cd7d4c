//! Application services.

pub mod publisher;

pub use publisher::{EonKeyPublisher, PublishOutcome};
