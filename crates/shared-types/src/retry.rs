//! Fixed-interval retry helper for idempotent side effects.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::shutdown::ShutdownSignal;

/// Run `operation` until it succeeds, waiting `interval` between attempts.
///
/// Returns `None` if shutdown is requested before an attempt succeeds. Errors
/// are logged and retried; the operation must therefore be idempotent.
pub async fn retry_with_interval<F, Fut, T, E>(
    signal: &mut ShutdownSignal,
    interval: Duration,
    mut operation: F,
) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    loop {
        if signal.is_cancelled() {
            return None;
        }
        match operation().await {
            Ok(value) => return Some(value),
            Err(err) => {
                warn!(error = %err, retry_in = ?interval, "operation failed, retrying");
            }
        }
        tokio::select! {
            _ = signal.cancelled() => return None,
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
