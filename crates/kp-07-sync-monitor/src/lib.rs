//! # KP-07 Sync Monitor
//!
//! Fails fast when chain sync stalls.
//!
//! ## Purpose
//!
//! A keyper that silently stops observing blocks would miss its slots
//! without anyone noticing. The monitor samples the sequencer sync cursor
//! on a fixed interval and terminates the process when it stops advancing:
//! - Inactive while the keyper is still bootstrapping (no eon, or the
//!   latest eon's DKG has not produced a result)
//! - A missing cursor is only worth a warning; sync may not have started
//! - Two consecutive samples without progress are a process-level fault
//!
//! ## Module Structure
//!
//! ```text
//! kp-07-sync-monitor/
//! ├── domain/          # MonitorError
//! ├── application/     # SyncMonitor
//! └── config.rs        # MonitorConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod application;
pub mod config;
pub mod domain;

// Re-exports
pub use application::{MonitorStore, SyncMonitor};
pub use config::MonitorConfig;
pub use domain::MonitorError;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
