#![forbid(unsafe_code)]

//! Page behavior controllers for sitekit.
//!
//! Each controller binds to the elements it finds at construction time and
//! reacts to [`PageEvent`]s routed to it by the bootstrapper. Controllers
//! never talk to each other; the only shared services (timer queue, page
//! scroll animation, screen-reader announcer) reach them through the
//! per-dispatch [`Context`].
//!
//! A constructor returns `None` when the page lacks the elements the
//! controller needs.

pub mod announcer;
pub mod back_to_top;
pub mod context;
pub mod faq;
pub mod form;
pub mod lazy;
pub mod nav;
pub mod perf;
pub mod reveal;
pub mod validation;

use std::time::Duration;

use sitekit_core::dom::Dom;
use sitekit_core::event::{Handled, PageEvent};

pub use announcer::Announcer;
pub use context::{Context, Services, Timer};

/// Stable identity of a controller inside the bootstrapper.
///
/// Ordering is dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ControllerKey {
    Navigation,
    LazyImages,
    Forms,
    Faq,
    BackToTop,
    Reveal,
    Performance,
}

impl ControllerKey {
    pub const ALL: [Self; 7] = [
        Self::Navigation,
        Self::LazyImages,
        Self::Forms,
        Self::Faq,
        Self::BackToTop,
        Self::Reveal,
        Self::Performance,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Navigation => "navigation",
            Self::LazyImages => "lazy-images",
            Self::Forms => "forms",
            Self::Faq => "faq",
            Self::BackToTop => "back-to-top",
            Self::Reveal => "reveal",
            Self::Performance => "performance",
        }
    }
}

/// A widget controller driven by page events.
pub trait Controller<D: Dom> {
    /// Key this controller is registered under.
    fn key(&self) -> ControllerKey;

    /// React to a page event.
    fn handle(
        &mut self,
        dom: &mut D,
        event: &PageEvent<D::Node>,
        cx: &mut Context<'_, D::Node>,
    ) -> Handled;

    /// A timer this controller scheduled has fired.
    fn on_timer(&mut self, dom: &mut D, timer: Timer<D::Node>, cx: &mut Context<'_, D::Node>) {
        let _ = (dom, timer, cx);
    }
}

pub(crate) const fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_sort_in_dispatch_order() {
        let mut keys = ControllerKey::ALL;
        keys.reverse();
        keys.sort();
        assert_eq!(keys, ControllerKey::ALL);
    }

    #[test]
    fn key_names_are_unique() {
        let mut names: Vec<_> = ControllerKey::ALL.iter().map(|k| k.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ControllerKey::ALL.len());
    }
}
