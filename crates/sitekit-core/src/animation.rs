#![forbid(unsafe_code)]

//! Easing curves and the smooth page-scroll animation.
//!
//! A [`ScrollAnimation`] is sampled once per animation frame with the host's
//! frame timestamp. The first sample pins the start time, so the animation
//! can be created before the first frame is known.

use std::time::Duration;

use crate::geometry::Rect;

/// Easing function signature: maps `t` in [0, 1] to output in [0, 1].
pub type EasingFn = fn(f64) -> f64;

/// Identity easing (constant velocity).
#[inline]
pub fn linear(t: f64) -> f64 {
    t.clamp(0.0, 1.0)
}

/// Quadratic ease-in-out (slow start and end).
#[inline]
pub fn ease_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Interpolates the page scroll offset from `from` to `to`.
#[derive(Debug, Clone, Copy)]
pub struct ScrollAnimation {
    from: f64,
    to: f64,
    duration: Duration,
    started: Option<Duration>,
    easing: EasingFn,
}

impl ScrollAnimation {
    /// Create an animation using [`ease_in_out`].
    #[must_use]
    pub fn new(from: f64, to: f64, duration: Duration) -> Self {
        Self {
            from,
            to,
            duration,
            started: None,
            easing: ease_in_out,
        }
    }

    /// Set the easing function.
    #[must_use]
    pub fn easing(mut self, easing: EasingFn) -> Self {
        self.easing = easing;
        self
    }

    /// Scroll offset the animation ends at.
    #[must_use]
    pub const fn target(&self) -> f64 {
        self.to
    }

    /// Raw linear progress at `now`, in [0.0, 1.0]. Pins the start time.
    pub fn progress(&mut self, now: Duration) -> f64 {
        let started = *self.started.get_or_insert(now);
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_sub(started);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// Scroll offset to apply for the frame at `now`.
    pub fn sample(&mut self, now: Duration) -> f64 {
        let t = self.progress(now);
        self.from + (self.to - self.from) * (self.easing)(t)
    }

    /// Whether the frame at `now` is the last one.
    pub fn is_complete(&mut self, now: Duration) -> bool {
        self.progress(now) >= 1.0
    }
}

/// Plan a smooth scroll that brings `target` (viewport-relative) to `offset`
/// pixels below the top of the viewport.
///
/// The destination is clamped at the top of the document.
#[must_use]
pub fn smooth_scroll_to(
    scroll_y: f64,
    target: &Rect,
    offset: f64,
    duration: Duration,
) -> ScrollAnimation {
    let destination = (target.top() + scroll_y - offset).max(0.0);
    ScrollAnimation::new(scroll_y, destination, duration)
}
