//! Application services.

pub mod middleware;
pub mod validation;

pub use middleware::{MessagingMiddleware, MiddlewareStore};
