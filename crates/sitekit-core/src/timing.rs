#![forbid(unsafe_code)]

//! Rate limiting for high-frequency page events.
//!
//! Scroll and resize listeners fire far more often than the widgets need to
//! react. This module provides two gates and two callable wrappers:
//!
//! | Gate | Wrapper | Behavior |
//! |------|---------|----------|
//! | [`Throttle`] | [`Throttled`] | first call of a window runs, the rest of the window is dropped |
//! | [`Debounce`] | [`Debounced`] | runs once after a quiet period, optionally also at the start of a burst |
//!
//! All times are host monotonic time (see [`crate::clock`]). Nothing here
//! sleeps or spawns; a debounced call only fires when the owner calls
//! [`Debounced::tick`] (or [`Debounce::poll`]) at or after its deadline.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use sitekit_core::timing::throttle;
//!
//! let mut hits = Vec::new();
//! let mut on_scroll = throttle(|y: u32| hits.push(y), Duration::from_millis(100));
//! on_scroll.call(Duration::from_millis(0), 10);
//! on_scroll.call(Duration::from_millis(50), 20);
//! on_scroll.call(Duration::from_millis(120), 30);
//! drop(on_scroll);
//! assert_eq!(hits, vec![10, 30]);
//! ```

use std::time::Duration;

/// Admit at most one call per `interval`.
///
/// There is no trailing call: a call made inside an open window is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    interval: Duration,
    window_end: Option<Duration>,
}

impl Throttle {
    /// Create a throttle with the given window length.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            window_end: None,
        }
    }

    /// Window length.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns `true` if a call at `now` should run, opening a new window.
    pub fn admit(&mut self, now: Duration) -> bool {
        match self.window_end {
            Some(end) if now < end => false,
            _ => {
                self.window_end = Some(now.saturating_add(self.interval));
                true
            }
        }
    }

    /// Forget the current window.
    pub fn reset(&mut self) {
        self.window_end = None;
    }
}

/// Delay a call until `wait` has elapsed without another trigger.
///
/// In leading mode the call also fires on the first trigger of a burst. The
/// trailing call then fires only if the burst had further triggers, so a
/// lone trigger runs once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Debounce {
    wait: Duration,
    fire_leading: bool,
    deadline: Option<Duration>,
    trailing: bool,
}

impl Debounce {
    /// Trailing-edge debounce.
    #[must_use]
    pub const fn new(wait: Duration) -> Self {
        Self {
            wait,
            fire_leading: false,
            deadline: None,
            trailing: false,
        }
    }

    /// Leading-edge debounce.
    #[must_use]
    pub const fn leading(wait: Duration) -> Self {
        Self {
            wait,
            fire_leading: true,
            deadline: None,
            trailing: false,
        }
    }

    /// Quiet period length.
    #[must_use]
    pub const fn wait(&self) -> Duration {
        self.wait
    }

    /// Whether this gate fires on the leading edge.
    #[must_use]
    pub const fn fires_leading(&self) -> bool {
        self.fire_leading
    }

    /// Record a trigger at `now`, pushing the deadline back.
    ///
    /// Returns `true` when the leading edge fires. Owners should
    /// [`poll`](Self::poll) before triggering so an overdue trailing call is
    /// not folded into the next burst.
    pub fn trigger(&mut self, now: Duration) -> bool {
        let quiet = self.deadline.is_none_or(|deadline| now >= deadline);
        self.deadline = Some(now.saturating_add(self.wait));
        let leading = self.fire_leading && quiet;
        self.trailing = !leading;
        leading
    }

    /// Returns `true` once when the trailing call is due.
    ///
    /// In leading mode a burst of a single trigger has no trailing call, but
    /// its due deadline is still cleared so the next trigger starts a new
    /// burst.
    pub fn poll(&mut self, now: Duration) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                std::mem::take(&mut self.trailing)
            }
            _ => false,
        }
    }

    /// Pending deadline, if a burst is open.
    #[must_use]
    pub const fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Drop the pending call.
    pub fn cancel(&mut self) {
        self.deadline = None;
        self.trailing = false;
    }
}

/// An action wrapped in a [`Throttle`].
pub struct Throttled<A, F> {
    gate: Throttle,
    action: F,
    _arg: std::marker::PhantomData<fn(A)>,
}

impl<A, F: FnMut(A)> Throttled<A, F> {
    /// Invoke the action unless the current window is already used.
    ///
    /// Returns whether the action ran.
    pub fn call(&mut self, now: Duration, arg: A) -> bool {
        if self.gate.admit(now) {
            (self.action)(arg);
            true
        } else {
            false
        }
    }
}

/// An action wrapped in a [`Debounce`].
///
/// The trailing call receives the argument of the last call in a burst.
pub struct Debounced<A, F> {
    gate: Debounce,
    action: F,
    pending: Option<A>,
}

impl<A, F: FnMut(A)> Debounced<A, F> {
    /// Record a call. Fires immediately only on the leading edge.
    pub fn call(&mut self, now: Duration, arg: A) {
        self.tick(now);
        if self.gate.trigger(now) {
            (self.action)(arg);
        } else {
            self.pending = Some(arg);
        }
    }

    /// Fire the trailing call if its deadline has passed.
    ///
    /// Returns whether the action ran.
    pub fn tick(&mut self, now: Duration) -> bool {
        if self.gate.poll(now)
            && let Some(arg) = self.pending.take()
        {
            (self.action)(arg);
            return true;
        }
        false
    }

    /// When the host should call [`tick`](Self::tick) next.
    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        self.gate.deadline()
    }

    /// Cancel the scheduled call without running it.
    pub fn cancel(&mut self) {
        self.gate.cancel();
        self.pending = None;
    }
}

/// Wrap `action` so it runs at most once per `interval`.
pub fn throttle<A, F: FnMut(A)>(action: F, interval: Duration) -> Throttled<A, F> {
    Throttled {
        gate: Throttle::new(interval),
        action,
        _arg: std::marker::PhantomData,
    }
}

/// Wrap `action` so a burst of calls runs it once.
///
/// The action runs `wait` after the last call. With `fire_leading` it also
/// runs at the first call, and a burst of one call runs it only then.
pub fn debounce<A, F: FnMut(A)>(action: F, wait: Duration, fire_leading: bool) -> Debounced<A, F> {
    let gate = if fire_leading {
        Debounce::leading(wait)
    } else {
        Debounce::new(wait)
    };
    Debounced {
        gate,
        action,
        pending: None,
    }
}
