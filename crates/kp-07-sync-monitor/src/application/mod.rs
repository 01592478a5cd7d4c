//! Application services.

pub mod monitor;

pub use monitor::{MonitorStore, SyncMonitor};
