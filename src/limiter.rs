//! Per-origin rate limiting
//!
//! One process-wide limiter is shared by the sequential and concurrent
//! drivers. Requests to the same origin are spaced at least `min_gap`
//! apart; requests to different origins never wait on each other.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Shared rate limiter keyed by origin (scheme + host + port)
#[derive(Debug, Default)]
pub struct RateLimiter {
    slots: Mutex<HashMap<String, Arc<Mutex<Option<Instant>>>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until a request slot for `origin` is available, then claims it.
    ///
    /// The per-origin lock is held across the sleep, so concurrent callers
    /// for one origin are granted slots strictly `min_gap` apart while other
    /// origins proceed independently. There is no upper bound on the wait.
    pub async fn await_slot(&self, origin: &str, min_gap: Duration) {
        if min_gap.is_zero() {
            return;
        }

        let slot = {
            let mut slots = self.slots.lock().await;
            slots.entry(origin.to_string()).or_default().clone()
        };

        let mut last_grant = slot.lock().await;
        if let Some(previous) = *last_grant {
            let ready_at = previous + min_gap;
            let now = Instant::now();
            if ready_at > now {
                let wait = ready_at - now;
                tracing::trace!(origin, wait_ms = wait.as_millis() as u64, "rate limit wait");
                tokio::time::sleep(wait).await;
            }
        }
        *last_grant = Some(Instant::now());
    }
}
