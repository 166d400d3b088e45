#![forbid(unsafe_code)]

//! `sitekit-web` boots the page controllers and drives them.
//!
//! [`App`] is host-agnostic: it owns a [`Dom`], the shared [`Services`], and
//! one boxed controller per [`ControllerKey`]. The embedding environment
//! pushes events with [`App::dispatch`] and advances time with
//! [`App::tick`], scheduling its next wake-up from [`App::next_deadline`]
//! and [`App::wants_animation_frame`].
//!
//! On `wasm32` the [`SiteKit`] export wires `App` to the browser.

pub mod config;
pub mod logging;

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::SiteKit;

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use sitekit_core::capabilities::HostCapabilities;
use sitekit_core::dom::Dom;
use sitekit_core::event::{Handled, PageError, PageEvent};
use sitekit_widgets::back_to_top::BackToTop;
use sitekit_widgets::faq::Faq;
use sitekit_widgets::form::{Forms, SubmitTransport};
use sitekit_widgets::lazy::LazyImages;
use sitekit_widgets::nav::Navigation;
use sitekit_widgets::perf::PerformanceSampler;
use sitekit_widgets::reveal::Reveal;
use sitekit_widgets::{Announcer, Controller, ControllerKey, Services};

use crate::config::SiteConfig;

/// Browser host error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebHostError {
    /// No `window` or `document` (not running in a page).
    NoDocument,
    /// The document has no `<body>` yet.
    NoBody,
    /// A browser API call threw.
    Js(String),
}

impl fmt::Display for WebHostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDocument => write!(f, "no window or document available"),
            Self::NoBody => write!(f, "document has no body"),
            Self::Js(msg) => write!(f, "browser error: {msg}"),
        }
    }
}

impl std::error::Error for WebHostError {}

/// The booted page: document, services, and live controllers.
pub struct App<D: Dom> {
    dom: D,
    services: Services<D::Node>,
    controllers: BTreeMap<ControllerKey, Box<dyn Controller<D>>>,
}

impl<D: Dom> fmt::Debug for App<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("controllers", &self.controllers.keys().collect::<Vec<_>>())
            .field("pending_timers", &self.services.pending_timers())
            .finish_non_exhaustive()
    }
}

impl<D: Dom + 'static> App<D> {
    /// Install the announcer and construct every controller whose elements
    /// are present.
    pub fn boot(
        mut dom: D,
        caps: HostCapabilities,
        config: SiteConfig,
        transport: Box<dyn SubmitTransport>,
        now: Duration,
    ) -> Self {
        let mut services = Services::new(caps);
        match Announcer::install(&mut dom) {
            Some(announcer) => services.install_announcer(announcer),
            None => tracing::warn!("screen reader announcer could not be created"),
        }

        let SiteConfig {
            navigation,
            lazy_images,
            forms,
            faq,
            back_to_top,
            reveal,
            performance,
            logging: _,
        } = config;

        let mut controllers: Vec<Box<dyn Controller<D>>> = Vec::new();
        if let Some(nav) = Navigation::new(&mut dom, navigation) {
            controllers.push(Box::new(nav));
        }
        if let Some(lazy) = LazyImages::new(&mut dom, lazy_images, &services.context(now)) {
            controllers.push(Box::new(lazy));
        }
        if let Some(forms) = Forms::new(&mut dom, forms, transport) {
            controllers.push(Box::new(forms));
        }
        if let Some(faq) = Faq::new(&mut dom, faq) {
            controllers.push(Box::new(faq));
        }
        if let Some(back_to_top) = BackToTop::new(&mut dom, back_to_top) {
            controllers.push(Box::new(back_to_top));
        }
        if let Some(reveal) = Reveal::new(&mut dom, reveal, &services.context(now)) {
            controllers.push(Box::new(reveal));
        }
        if let Some(sampler) =
            PerformanceSampler::new(&mut dom, performance, &mut services.context(now))
        {
            controllers.push(Box::new(sampler));
        }

        let controllers: BTreeMap<_, _> = controllers.into_iter().map(|c| (c.key(), c)).collect();
        tracing::info!(
            controllers = ?controllers.keys().map(|k| k.name()).collect::<Vec<_>>(),
            "site initialized"
        );
        Self {
            dom,
            services,
            controllers,
        }
    }

    /// Route `event` to every controller in dispatch order.
    pub fn dispatch(&mut self, event: &PageEvent<D::Node>, now: Duration) -> Handled {
        let mut cx = self.services.context(now);
        self.controllers
            .values_mut()
            .fold(Handled::No, |handled, controller| {
                handled.merge(controller.handle(&mut self.dom, event, &mut cx))
            })
    }

    /// Fire due timers and apply the scroll animation frame at `now`.
    ///
    /// Returns `true` while the scroll animation wants more frames.
    pub fn tick(&mut self, now: Duration) -> bool {
        while let Some(timer) = self.services.pop_due(now) {
            let owner = timer.owner();
            let Some(controller) = self.controllers.get_mut(&owner) else {
                tracing::debug!(owner = owner.name(), "timer for absent controller dropped");
                continue;
            };
            controller.on_timer(&mut self.dom, timer, &mut self.services.context(now));
        }
        self.services.advance_scroll(&mut self.dom, now)
    }

    /// Log an uncaught error or unhandled rejection.
    ///
    /// Rejections ask the host to suppress the browser's own report.
    pub fn report_error(&self, error: &PageError) -> Handled {
        match error {
            PageError::Uncaught { .. } => {
                tracing::error!(error = %error, "uncaught page error");
                Handled::Yes
            }
            PageError::UnhandledRejection { .. } => {
                tracing::error!(error = %error, "unhandled promise rejection");
                Handled::PreventDefault
            }
        }
    }

    /// Speak `message` through the live region.
    pub fn announce(&mut self, message: &str) {
        if let Some(announcer) = self.services.announcer() {
            announcer.announce(&mut self.dom, message);
        }
    }

    /// Earliest pending timer deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.services.next_deadline()
    }

    #[must_use]
    pub fn wants_animation_frame(&self) -> bool {
        self.services.scroll_in_flight()
    }

    /// Whether a controller was constructed for `key`.
    #[must_use]
    pub fn has(&self, key: ControllerKey) -> bool {
        self.controllers.contains_key(&key)
    }

    /// Keys of the live controllers, in dispatch order.
    pub fn controllers(&self) -> impl Iterator<Item = ControllerKey> + '_ {
        self.controllers.keys().copied()
    }

    #[must_use]
    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.dom
    }
}
