//! Minimum-interval spacing for calls to the geocoding provider.
//!
//! Public geocoding endpoints enforce usage policies (Nominatim asks for at
//! most one request per second). Excess demand queues behind the next free
//! slot rather than failing.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Serializes callers so consecutive provider calls are at least `interval`
/// apart. Waiters are granted slots in lock-acquisition order.
pub struct RateLimiter {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Waits until this caller's slot opens. A zero interval never sleeps.
    pub async fn acquire(&self) {
        if self.interval.is_zero() {
            return;
        }
        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next {
                Some(at) if at > now => at,
                _ => now,
            };
            *next = Some(slot + self.interval);
            slot
        };
        tokio::time::sleep_until(slot).await;
    }
}
