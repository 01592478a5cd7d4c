//! # KP-04 Slot Scheduler
//!
//! Turns beacon slots into decryption triggers.
//!
//! ## Purpose
//!
//! Drive the per-slot decryption pipeline:
//! - A slot ticker aligned to genesis time, gap-filling missed slots
//! - The trigger algorithm: resolve the active keyper set and eon at the
//!   synced block, advance or recover the tx pointer, select queued
//!   submissions under the gas budget, and emit the ordered identity
//!   preimages to the keyper core
//!
//! ## Module Structure
//!
//! ```text
//! kp-04-slot-scheduler/
//! ├── domain/          # Scheduler errors
//! ├── ports/           # Clock
//! ├── application/     # SlotTicker, SlotScheduler
//! └── config.rs        # SchedulerConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use application::{SchedulerStore, SlotScheduler, SlotTicker};
pub use config::SchedulerConfig;
pub use domain::SchedulerError;
pub use ports::{Clock, SystemClock};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
