//! # Shutdown Plumbing
//!
//! A single cancellation signal propagated to all long-running tasks. Tasks
//! finish their in-flight work and exit; retry loops check the signal between
//! attempts.

use tokio::sync::watch;

/// Owning side of the shutdown signal. Dropping it (or calling
/// [`Shutdown::trigger`]) cancels every subscribed task.
#[derive(Debug)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

/// Receiving side handed to each task.
#[derive(Clone, Debug)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// Create a new shutdown handle and its first signal.
    pub fn new() -> (Self, ShutdownSignal) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, ShutdownSignal { rx })
    }

    /// Request shutdown of all subscribed tasks.
    pub fn trigger(&self) {
        // Send fails only if every receiver is gone, which is fine.
        let _ = self.tx.send(true);
    }

    /// A fresh signal for another task.
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }
}

impl Drop for Shutdown {
    fn drop(&mut self) {
        self.trigger();
    }
}

impl ShutdownSignal {
    /// Whether shutdown has been requested.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown is requested.
    pub async fn cancelled(&mut self) {
        // wait_for returns immediately if the value is already true; a closed
        // channel also means the owner is gone and we should stop.
        let _ = self.rx.wait_for(|v| *v).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_cancels_signal() {
        let (shutdown, mut signal) = Shutdown::new();
        assert!(!signal.is_cancelled());
        shutdown.trigger();
        signal.cancelled().await;
        assert!(signal.is_cancelled());
    }

    #[tokio::test]
    async fn test_drop_cancels_all_subscribers() {
        let (shutdown, mut first) = Shutdown::new();
        let mut second = shutdown.subscribe();
        drop(shutdown);
        first.cancelled().await;
        second.cancelled().await;
    }
}
