//! Observability: rate-limited diagnostic logging
//!
//! The engine itself has no ambient state. Hosts that want diagnostics hand it
//! a `LogBudget`; clones share one counter, so a single budget can throttle
//! every engine in the process.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Fixed-window event budget
#[derive(Debug, Clone)]
pub struct LogBudget {
    inner: Arc<Mutex<BudgetWindow>>,
    max_events: u32,
    window: Duration,
}

#[derive(Debug)]
struct BudgetWindow {
    used: u32,
    window_start: Instant,
}

impl LogBudget {
    pub fn new(max_events: u32, window: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BudgetWindow {
                used: 0,
                window_start: Instant::now(),
            })),
            max_events,
            window,
        }
    }

    /// At most one event per `cooldown`
    pub fn cooldown(cooldown: Duration) -> Self {
        Self::new(1, cooldown)
    }

    /// Take one token. Never panics; a poisoned lock just denies the event.
    pub fn try_acquire(&self) -> bool {
        let Ok(mut bucket) = self.inner.lock() else {
            return false;
        };
        let now = Instant::now();
        if now.duration_since(bucket.window_start) >= self.window {
            bucket.used = 0;
            bucket.window_start = now;
        }
        if bucket.used < self.max_events {
            bucket.used += 1;
            true
        } else {
            false
        }
    }

    /// Tokens left in the current window
    pub fn remaining(&self) -> u32 {
        match self.inner.lock() {
            Ok(bucket) => {
                if bucket.window_start.elapsed() >= self.window {
                    self.max_events
                } else {
                    self.max_events.saturating_sub(bucket.used)
                }
            }
            Err(_) => 0,
        }
    }
}

/// Log helpers used by the engine. All of them are no-ops without a budget.
pub(crate) struct Diagnostics<'a> {
    budget: Option<&'a LogBudget>,
}

impl<'a> Diagnostics<'a> {
    pub(crate) fn new(budget: Option<&'a LogBudget>) -> Self {
        Self { budget }
    }

    fn allowed(&self) -> bool {
        self.budget.map(|b| b.try_acquire()).unwrap_or(false)
    }

    pub(crate) fn day_boundary(&self, symbol: &str, interval: &str, anchor: usize, index: usize) {
        if self.allowed() {
            tracing::debug!(
                symbol = %symbol,
                interval = %interval,
                anchor,
                index,
                "vwap anchored at day boundary"
            );
        }
    }

    pub(crate) fn skipped(&self, symbol: &str, reason: &str) {
        if self.allowed() {
            tracing::debug!(symbol = %symbol, reason = %reason, "signal skipped");
        }
    }

    pub(crate) fn trimmed(&self, symbol: &str, interval: &str, dropped: usize) {
        if self.allowed() {
            tracing::info!(symbol = %symbol, interval = %interval, dropped, "look-ahead guard trimmed candles");
        }
    }

    pub(crate) fn regime_override(&self, symbol: &str, would_be: &str) {
        if self.allowed() {
            tracing::info!(symbol = %symbol, would_be = %would_be, "bear regime forced WATCH");
        }
    }
}
