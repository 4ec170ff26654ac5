//! Leading/trailing-edge throttle for bursty UI events.

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};
#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

/// Coalesces a burst of values into at most one evaluation per interval.
///
/// The first value of a burst passes immediately. Values arriving inside the
/// interval are held back; only the latest one is kept and it is released by
/// [`Throttle::poll`] once the interval has elapsed, so the final event of a
/// burst is never lost.
#[derive(Debug, Clone)]
pub struct Throttle<T> {
    interval: Duration,
    last_run: Option<Instant>,
    pending: Option<T>,
}

impl<T> Throttle<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
            pending: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Offer a value. Returns it back if it may be processed now.
    pub fn submit(&mut self, value: T, now: Instant) -> Option<T> {
        if self.is_open(now) {
            self.last_run = Some(now);
            self.pending = None;
            Some(value)
        } else {
            self.pending = Some(value);
            None
        }
    }

    /// Release the held-back value if the interval has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if self.pending.is_some() && self.is_open(now) {
            self.last_run = Some(now);
            self.pending.take()
        } else {
            None
        }
    }

    /// Release the held-back value regardless of timing.
    pub fn flush(&mut self, now: Instant) -> Option<T> {
        let value = self.pending.take()?;
        self.last_run = Some(now);
        Some(value)
    }

    /// Whether a value is waiting for the trailing edge.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop any held-back value and forget the last run.
    pub fn reset(&mut self) {
        self.last_run = None;
        self.pending = None;
    }

    fn is_open(&self, now: Instant) -> bool {
        match self.last_run {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        }
    }
}
