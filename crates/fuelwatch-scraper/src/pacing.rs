//! Minimum spacing between upstream requests.
//!
//! Concurrent fetches share one [`Pacer`]; each call to [`Pacer::wait`] takes
//! the next free slot, so request starts are at least `gap` apart no matter
//! how many fetches are in flight.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug)]
pub struct Pacer {
    gap: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Pacer {
    #[must_use]
    pub fn new(gap: Duration) -> Self {
        Self {
            gap,
            next_slot: Mutex::new(None),
        }
    }

    /// Sleeps until this caller's slot opens. The first call returns at once.
    pub async fn wait(&self) {
        if self.gap.is_zero() {
            return;
        }

        let mut next_slot = self.next_slot.lock().await;
        if let Some(slot) = *next_slot {
            tokio::time::sleep_until(slot).await;
        }
        *next_slot = Some(Instant::now() + self.gap);
    }
}
