//! Application services.

pub mod scheduler;
pub mod ticker;

pub use scheduler::{SchedulerStore, SlotScheduler};
pub use ticker::SlotTicker;
