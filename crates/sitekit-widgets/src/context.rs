#![forbid(unsafe_code)]

//! Services shared by every controller during a dispatch.
//!
//! [`Services`] is owned by the bootstrapper: the timer queue, the single
//! in-flight page scroll animation, and the announcer. [`Context`] is the
//! short-lived borrow of those services handed to a controller for one
//! event or timer.
//!
//! # Scroll animation
//!
//! There is one page scroll offset, so there is at most one animation. A new
//! request replaces the one in flight; a zero duration jumps immediately.
//! The host advances the animation once per frame with
//! [`Services::advance_scroll`].

use std::time::Duration;

use sitekit_core::animation::{ScrollAnimation, smooth_scroll_to};
use sitekit_core::capabilities::HostCapabilities;
use sitekit_core::dom::Dom;
use sitekit_core::event::SubmitError;
use sitekit_core::timer::{TimerId, TimerQueue};

use crate::ControllerKey;
use crate::announcer::Announcer;

/// A deferred callback, addressed to the controller that scheduled it.
#[derive(Debug, Clone, PartialEq)]
pub enum Timer<N> {
    /// The resize debounce window may have elapsed.
    ResizeSettled,
    /// A transport's delayed outcome is ready.
    SubmissionSettled {
        form: N,
        outcome: Result<(), SubmitError>,
    },
    /// A form status banner has been visible long enough.
    DismissBanner { banner: N },
    /// Time to read the resource timing buffer.
    ResourceAudit,
}

impl<N> Timer<N> {
    /// Controller the timer is delivered to.
    #[must_use]
    pub const fn owner(&self) -> ControllerKey {
        match self {
            Self::ResizeSettled => ControllerKey::Navigation,
            Self::SubmissionSettled { .. } | Self::DismissBanner { .. } => ControllerKey::Forms,
            Self::ResourceAudit => ControllerKey::Performance,
        }
    }
}

/// Long-lived services owned by the bootstrapper.
#[derive(Debug)]
pub struct Services<N> {
    caps: HostCapabilities,
    timers: TimerQueue<Timer<N>>,
    scroll: Option<ScrollAnimation>,
    announcer: Option<Announcer<N>>,
}

impl<N: Clone> Services<N> {
    #[must_use]
    pub fn new(caps: HostCapabilities) -> Self {
        Self {
            caps,
            timers: TimerQueue::new(),
            scroll: None,
            announcer: None,
        }
    }

    #[must_use]
    pub const fn caps(&self) -> HostCapabilities {
        self.caps
    }

    pub fn install_announcer(&mut self, announcer: Announcer<N>) {
        self.announcer = Some(announcer);
    }

    #[must_use]
    pub fn announcer(&self) -> Option<&Announcer<N>> {
        self.announcer.as_ref()
    }

    /// Borrow the services for one dispatch at `now`.
    pub fn context(&mut self, now: Duration) -> Context<'_, N> {
        Context {
            now,
            caps: self.caps,
            timers: &mut self.timers,
            scroll: &mut self.scroll,
            announcer: self.announcer.as_ref(),
        }
    }

    /// Next timer due at or before `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<Timer<N>> {
        self.timers.pop_due(now)
    }

    /// Earliest pending timer deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Whether a scroll animation wants another frame.
    #[must_use]
    pub const fn scroll_in_flight(&self) -> bool {
        self.scroll.is_some()
    }

    /// Apply the animation frame at `now`.
    ///
    /// Returns `true` while more frames are needed.
    pub fn advance_scroll<D: Dom<Node = N>>(&mut self, dom: &mut D, now: Duration) -> bool {
        let Some(animation) = self.scroll.as_mut() else {
            return false;
        };
        dom.scroll_to(animation.sample(now));
        if animation.is_complete(now) {
            self.scroll = None;
            return false;
        }
        true
    }
}

/// Per-dispatch view of the [`Services`].
pub struct Context<'a, N> {
    now: Duration,
    caps: HostCapabilities,
    timers: &'a mut TimerQueue<Timer<N>>,
    scroll: &'a mut Option<ScrollAnimation>,
    announcer: Option<&'a Announcer<N>>,
}

impl<N: Clone> Context<'_, N> {
    /// Host time of the current dispatch.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    #[must_use]
    pub const fn caps(&self) -> HostCapabilities {
        self.caps
    }

    /// Deliver `timer` to its owner `delay` from now.
    pub fn schedule(&mut self, delay: Duration, timer: Timer<N>) -> TimerId {
        self.timers.schedule_in(self.now, delay, timer)
    }

    /// Deliver `timer` to its owner at the absolute time `at`.
    pub fn schedule_at(&mut self, at: Duration, timer: Timer<N>) -> TimerId {
        self.timers.schedule(at, timer)
    }

    pub fn cancel(&mut self, id: TimerId) {
        self.timers.cancel(id);
    }

    /// Smooth-scroll the page to offset `y`.
    pub fn scroll_to_y<D: Dom<Node = N>>(&mut self, dom: &mut D, y: f64, duration: Duration) {
        let animation = ScrollAnimation::new(dom.scroll_y(), y.max(0.0), duration);
        self.start_scroll(dom, animation);
    }

    /// Smooth-scroll so `target` sits `offset` pixels below the viewport top.
    pub fn scroll_to_element<D: Dom<Node = N>>(
        &mut self,
        dom: &mut D,
        target: &N,
        offset: f64,
        duration: Duration,
    ) {
        let animation = smooth_scroll_to(dom.scroll_y(), &dom.rect(target), offset, duration);
        self.start_scroll(dom, animation);
    }

    fn start_scroll<D: Dom<Node = N>>(&mut self, dom: &mut D, mut animation: ScrollAnimation) {
        if animation.is_complete(self.now) {
            *self.scroll = None;
            dom.scroll_to(animation.target());
            return;
        }
        *self.scroll = Some(animation);
    }

    /// Read `message` out through the live region, if one is installed.
    pub fn announce<D: Dom<Node = N>>(&self, dom: &mut D, message: &str) {
        if let Some(announcer) = self.announcer {
            announcer.announce(dom, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::millis;
    use sitekit_core::dom::memory::{MemoryDom, NodeId};
    use sitekit_core::geometry::Rect;

    fn services() -> Services<NodeId> {
        Services::new(HostCapabilities::modern())
    }

    #[test]
    fn timers_are_routed_to_their_owner() {
        assert_eq!(Timer::<NodeId>::ResizeSettled.owner(), ControllerKey::Navigation);
        assert_eq!(Timer::<NodeId>::ResourceAudit.owner(), ControllerKey::Performance);
        let form = MemoryDom::new().body();
        let timer = Timer::DismissBanner { banner: form };
        assert_eq!(timer.owner(), ControllerKey::Forms);
    }

    #[test]
    fn scheduled_timers_pop_when_due() {
        let mut services = services();
        services
            .context(millis(1_000))
            .schedule(millis(250), Timer::ResizeSettled);
        assert_eq!(services.next_deadline(), Some(millis(1_250)));
        assert_eq!(services.pop_due(millis(1_249)), None);
        assert_eq!(services.pop_due(millis(1_250)), Some(Timer::ResizeSettled));
        assert_eq!(services.pending_timers(), 0);
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut services = services();
        let mut cx = services.context(millis(0));
        let id = cx.schedule(millis(10), Timer::ResourceAudit);
        cx.cancel(id);
        assert_eq!(services.pop_due(millis(100)), None);
    }

    #[test]
    fn scroll_animation_runs_to_target_and_stops() {
        let mut dom = MemoryDom::new();
        let mut services = services();
        services
            .context(millis(0))
            .scroll_to_y(&mut dom, 400.0, millis(800));
        assert!(services.scroll_in_flight());

        assert!(services.advance_scroll(&mut dom, millis(400)));
        assert!((dom.scroll_y() - 200.0).abs() < 1e-6);

        assert!(!services.advance_scroll(&mut dom, millis(800)));
        assert_eq!(dom.scroll_y(), 400.0);
        assert!(!services.scroll_in_flight());
    }

    #[test]
    fn zero_duration_jumps_immediately() {
        let mut dom = MemoryDom::new();
        let mut services = services();
        services
            .context(millis(0))
            .scroll_to_y(&mut dom, 300.0, Duration::ZERO);
        assert_eq!(dom.scroll_y(), 300.0);
        assert!(!services.scroll_in_flight());
    }

    #[test]
    fn new_scroll_replaces_in_flight_one() {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        let section = dom.add(body, "section", &[]);
        dom.set_rect(section, Rect::new(0.0, 1_500.0, 800.0, 300.0));

        let mut services = services();
        services
            .context(millis(0))
            .scroll_to_y(&mut dom, 5_000.0, millis(800));
        services
            .context(millis(100))
            .scroll_to_element(&mut dom, &section, 70.0, millis(800));

        assert!(services.advance_scroll(&mut dom, millis(100)));
        assert!(!services.advance_scroll(&mut dom, millis(900)));
        assert_eq!(dom.scroll_y(), 1_430.0);
    }

    #[test]
    fn announce_without_region_is_silent() {
        let mut dom = MemoryDom::new();
        let mut services = services();
        services.context(millis(0)).announce(&mut dom, "hello");
        assert_eq!(dom.text(&dom.body()), "");
    }
}
