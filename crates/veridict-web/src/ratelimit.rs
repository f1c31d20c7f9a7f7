//! Fixed-window per-client rate limiting.
//!
//! Wall-clock windows, not a sliding log: a burst straddling a window
//! boundary may briefly admit up to twice the nominal rate, which is an
//! accepted approximation. Counters are in-memory and reset on restart; in
//! a multi-instance deployment this degrades to a per-instance limit. It is
//! a soft abuse deterrent, not a security control.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Time source, injectable so tests can drive the window deterministically.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    /// Denied; retry after this many whole seconds (always >= 1).
    Denied { retry_after_secs: u64 },
}

struct Counter {
    count: u32,
    window_start: Instant,
}

pub struct RateLimiter {
    window: Duration,
    cap: u32,
    clock: Arc<dyn Clock>,
    counters: Mutex<HashMap<String, Counter>>,
}

impl RateLimiter {
    pub fn new(window: Duration, cap: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            window,
            cap,
            clock,
            counters: Mutex::new(HashMap::new()),
        }
    }

    /// Admit or deny a request from `client_id`. At the cap, requests are
    /// denied without incrementing further.
    pub fn check(&self, client_id: &str) -> Decision {
        let now = self.clock.now();
        let mut counters = self
            .counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let counter = counters.entry(client_id.to_string()).or_insert(Counter {
            count: 0,
            window_start: now,
        });

        if now.duration_since(counter.window_start) >= self.window {
            counter.count = 0;
            counter.window_start = now;
        }

        if counter.count >= self.cap {
            let elapsed = now.duration_since(counter.window_start);
            let remaining = self.window.saturating_sub(elapsed);
            return Decision::Denied {
                retry_after_secs: remaining.as_secs().max(1),
            };
        }

        counter.count += 1;
        Decision::Allowed
    }
}
