#![forbid(unsafe_code)]

//! "Back to top" control.

use serde::Deserialize;
use sitekit_core::dom::Dom;
use sitekit_core::event::{Handled, PageEvent};
use sitekit_core::timing::Throttle;

use crate::context::Context;
use crate::{Controller, ControllerKey, millis};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BackToTopConfig {
    pub selector: String,
    pub visible_class: String,
    /// Scroll offset past which the control is shown.
    pub threshold: f64,
    /// Receives focus once the page is back at the top.
    pub skip_link: String,
    pub scroll_throttle_ms: u64,
    pub scroll_duration_ms: u64,
}

impl Default for BackToTopConfig {
    fn default() -> Self {
        Self {
            selector: ".back-to-top".into(),
            visible_class: "visible".into(),
            threshold: 300.0,
            skip_link: ".skip-link".into(),
            scroll_throttle_ms: 100,
            scroll_duration_ms: 800,
        }
    }
}

#[derive(Debug)]
pub struct BackToTop<N> {
    config: BackToTopConfig,
    button: N,
    visible: bool,
    gate: Throttle,
}

impl<N: Clone + PartialEq> BackToTop<N> {
    pub fn new<D: Dom<Node = N>>(dom: &mut D, config: BackToTopConfig) -> Option<Self> {
        let button = dom.query(&config.selector)?;
        Some(Self {
            gate: Throttle::new(millis(config.scroll_throttle_ms)),
            config,
            button,
            visible: false,
        })
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    fn on_scroll<D: Dom<Node = N>>(&mut self, dom: &mut D, cx: &Context<'_, N>) -> Handled {
        if !self.gate.admit(cx.now()) {
            return Handled::No;
        }
        let visible = dom.scroll_y() > self.config.threshold;
        if visible != self.visible {
            self.visible = visible;
            dom.toggle_class(&self.button, &self.config.visible_class, visible);
        }
        Handled::Yes
    }
}

impl<D: Dom> Controller<D> for BackToTop<D::Node> {
    fn key(&self) -> ControllerKey {
        ControllerKey::BackToTop
    }

    fn handle(
        &mut self,
        dom: &mut D,
        event: &PageEvent<D::Node>,
        cx: &mut Context<'_, D::Node>,
    ) -> Handled {
        match event {
            PageEvent::Scroll => self.on_scroll(dom, cx),
            PageEvent::Click { target } if dom.contains(&self.button, target) => {
                cx.scroll_to_y(dom, 0.0, millis(self.config.scroll_duration_ms));
                if let Some(skip) = dom.query(&self.config.skip_link) {
                    dom.focus(&skip);
                }
                Handled::PreventDefault
            }
            _ => Handled::No,
        }
    }
}
