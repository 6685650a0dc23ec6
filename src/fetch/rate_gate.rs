use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Mutex as AsyncMutex;
use tokio::time::{Duration, Instant};

use crate::utils::{Clock, TokioClock};

type Slot = Arc<AsyncMutex<Option<Instant>>>;

/// Per-key minimum-interval throttle shared by every request in the process.
///
/// Each key owns an async lock that is held across read-last, wait and
/// stamp-now, so two callers for the same key can never both compute a short
/// wait. The outer map lock is only held long enough to look up the slot,
/// which keeps distinct keys independent. Idle keys are forgotten once their
/// interval has passed, so the map only holds recently used symbols.
pub struct RateGate {
    interval: Duration,
    clock: Arc<dyn Clock>,
    slots: Mutex<HashMap<String, Slot>>,
}

impl RateGate {
    pub fn new(interval: Duration) -> Self {
        Self::with_clock(interval, Arc::new(TokioClock))
    }

    pub fn with_clock(interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            interval,
            clock,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until `key` may be used again, then record the permitted call.
    pub async fn acquire(&self, key: &str) {
        if self.interval.is_zero() {
            return;
        }

        let slot = self.slot(key);
        let mut last = slot.lock().await;

        if let Some(previous) = *last {
            let ready_at = previous + self.interval;
            if self.clock.now() < ready_at {
                self.clock.sleep_until(ready_at).await;
            }
        }

        *last = Some(self.clock.now());
    }

    /// Number of distinct keys seen so far.
    pub fn tracked_keys(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn slot(&self, key: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        self.prune_expired(&mut slots);
        Arc::clone(slots.entry(key.to_string()).or_default())
    }

    /// Drop slots nobody holds whose last stamp is at least one interval old.
    /// A fresh slot behaves exactly like an expired one, so callers see no
    /// difference. Clones only happen under the map lock, so a strong count
    /// of one means no caller can be waiting on the slot.
    fn prune_expired(&self, slots: &mut HashMap<String, Slot>) {
        let now = self.clock.now();
        slots.retain(|_, slot| {
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            match slot.try_lock() {
                Ok(last) => {
                    matches!(*last, Some(at) if now.saturating_duration_since(at) < self.interval)
                }
                Err(_) => true,
            }
        });
    }
}
