//! Domain layer.

pub mod errors;

pub use errors::SchedulerError;
