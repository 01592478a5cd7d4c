//! # Slot Ticker
//!
//! Emits slot numbers aligned to the genesis time. A slot `s` is delivered
//! at `genesis + s * slot_duration`; slots missed while the process fell
//! behind are emitted immediately, so consumers see every slot number
//! exactly once and in order.

use std::sync::Arc;

use shared_types::{ShutdownSignal, SlotTiming};
use tokio::sync::mpsc;
use tokio::time::Duration;

use crate::ports::Clock;

/// The slot number due at or after `now`: `ceil((now - genesis) / duration)`.
fn next_slot_number(timing: &SlotTiming, now: u64) -> u64 {
    if now <= timing.genesis_slot_timestamp {
        return 0;
    }
    (now - timing.genesis_slot_timestamp).div_ceil(timing.seconds_per_slot)
}

/// Genesis-aligned slot source.
pub struct SlotTicker {
    timing: SlotTiming,
    clock: Arc<dyn Clock>,
}

impl SlotTicker {
    /// A ticker over the given timing, reading time from `clock`.
    pub fn new(timing: SlotTiming, clock: Arc<dyn Clock>) -> Self {
        Self { timing, clock }
    }

    /// Spawn the ticker task. The returned channel has capacity 1; a slow
    /// consumer delays delivery but never loses a slot.
    pub fn spawn(self, shutdown: ShutdownSignal) -> mpsc::Receiver<u64> {
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(self.run(tx, shutdown));
        rx
    }

    async fn run(self, tx: mpsc::Sender<u64>, mut shutdown: ShutdownSignal) {
        let mut prev: Option<u64> = None;
        loop {
            let now = self.clock.unix_now();
            let mut next = next_slot_number(&self.timing, now);
            if let Some(prev) = prev {
                if next < prev {
                    tracing::error!(
                        now,
                        slot = next,
                        previous_slot = prev,
                        "Clock moved backwards, continuing from the previous slot"
                    );
                }
                if next <= prev {
                    next = prev + 1;
                }
                for slot in prev + 1..next {
                    tracing::warn!(slot, "Emitting missed slot");
                    if !send_slot(&tx, &mut shutdown, slot).await {
                        return;
                    }
                }
            }

            let start = self.timing.slot_start_timestamp(next);
            let wait = start.saturating_sub(self.clock.unix_now());
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = tokio::time::sleep(Duration::from_secs(wait)) => {}
            }
            if !send_slot(&tx, &mut shutdown, next).await {
                return;
            }
            prev = Some(next);
        }
    }
}

async fn send_slot(tx: &mpsc::Sender<u64>, shutdown: &mut ShutdownSignal, slot: u64) -> bool {
    tokio::select! {
        _ = shutdown.cancelled() => false,
        result = tx.send(slot) => result.is_ok(),
    }
}
