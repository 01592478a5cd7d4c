//! Application services.

pub mod service;

pub use service::Fetcher;
