#![forbid(unsafe_code)]

//! Host-controlled monotonic time.

use std::time::Duration;

/// Deterministic monotonic clock controlled by the host.
///
/// Time only moves when the host calls [`set`](Self::set) or
/// [`advance`](Self::advance). Moving backwards is ignored so that timer
/// deadlines stay monotonic.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Current monotonic time.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Set current monotonic time. Earlier values are ignored.
    pub fn set(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}
