//! Schedule-or-replace call coalescing
//!
//! A burst of `schedule` calls collapses into a single value delivered by
//! `poll` once the delay has elapsed since the *last* call. The caller owns the
//! clock: every method takes `now`, so the frame loop can drive it and tests
//! can step time without sleeping.

use instant::Instant;
use std::time::Duration;

/// Delay used to coalesce map resize signals
pub const DEFAULT_RESIZE_DELAY: Duration = Duration::from_millis(100);

/// Debounces a value until no new value has been scheduled for `delay`
#[derive(Debug)]
pub struct Coalescer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Coalescer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Schedule `value`, replacing any pending one and restarting the delay.
    /// Returns `true` if a pending value was replaced.
    pub fn schedule(&mut self, value: T, now: Instant) -> bool {
        self.pending.replace((value, now + self.delay)).is_some()
    }

    /// Take the pending value if its deadline has passed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.pending {
            Some((_, deadline)) if now >= deadline => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }

    /// Time left before the pending value becomes due
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        let (_, deadline) = self.pending.as_ref()?;
        if now >= *deadline {
            Some(Duration::ZERO)
        } else {
            Some(*deadline - now)
        }
    }

    #[cfg(test)]
    fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    #[inline]
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl<T> Default for Coalescer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_RESIZE_DELAY)
    }
}
