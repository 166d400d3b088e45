#![forbid(unsafe_code)]

//! One-shot entrance animations triggered by scrolling.

use serde::Deserialize;
use sitekit_core::dom::Dom;
use sitekit_core::event::{Handled, ObserverKind, PageEvent};

use crate::context::Context;
use crate::{Controller, ControllerKey};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    pub selector: String,
    pub revealed_class: String,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            selector: ".animate-on-scroll".into(),
            revealed_class: "animated".into(),
        }
    }
}

/// Adds the revealed class to each element the first time it scrolls into
/// view, then forgets about it.
#[derive(Debug)]
pub struct Reveal<N> {
    config: RevealConfig,
    pending: Vec<N>,
}

impl<N: Clone + PartialEq> Reveal<N> {
    pub fn new<D: Dom<Node = N>>(
        dom: &mut D,
        config: RevealConfig,
        cx: &Context<'_, N>,
    ) -> Option<Self> {
        let elements = dom.query_all(&config.selector);
        if elements.is_empty() {
            return None;
        }
        if !cx.caps().intersection_observer {
            for element in &elements {
                dom.add_class(element, &config.revealed_class);
            }
            return Some(Self {
                config,
                pending: Vec::new(),
            });
        }
        for element in &elements {
            dom.observe(element, ObserverKind::Reveal);
        }
        Some(Self {
            config,
            pending: elements,
        })
    }

    /// Elements still waiting to be revealed.
    #[must_use]
    pub fn pending(&self) -> &[N] {
        &self.pending
    }
}

impl<D: Dom> Controller<D> for Reveal<D::Node> {
    fn key(&self) -> ControllerKey {
        ControllerKey::Reveal
    }

    fn handle(
        &mut self,
        dom: &mut D,
        event: &PageEvent<D::Node>,
        _cx: &mut Context<'_, D::Node>,
    ) -> Handled {
        let PageEvent::Intersection {
            target,
            observer: ObserverKind::Reveal,
            intersecting: true,
        } = event
        else {
            return Handled::No;
        };
        let Some(idx) = self.pending.iter().position(|n| n == target) else {
            return Handled::No;
        };
        let element = self.pending.swap_remove(idx);
        dom.add_class(&element, &self.config.revealed_class);
        dom.unobserve(&element, ObserverKind::Reveal);
        Handled::Yes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Services;
    use sitekit_core::capabilities::HostCapabilities;
    use sitekit_core::dom::memory::{MemoryDom, NodeId};
    use std::time::Duration;

    fn page() -> (MemoryDom, Vec<NodeId>) {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        let cards = (0..3)
            .map(|_| dom.add(body, "div", &[("class", "card animate-on-scroll")]))
            .collect();
        (dom, cards)
    }

    fn boot(dom: &mut MemoryDom, caps: HostCapabilities) -> (Reveal<NodeId>, Services<NodeId>) {
        let mut services = Services::new(caps);
        let cx = services.context(Duration::ZERO);
        let reveal = Reveal::new(dom, RevealConfig::default(), &cx).expect("elements");
        drop(cx);
        (reveal, services)
    }

    fn seen(target: NodeId, intersecting: bool) -> PageEvent<NodeId> {
        PageEvent::Intersection {
            target,
            observer: ObserverKind::Reveal,
            intersecting,
        }
    }

    #[test]
    fn first_intersection_reveals_and_unobserves() {
        let (mut dom, cards) = page();
        let (mut reveal, mut services) = boot(&mut dom, HostCapabilities::modern());
        assert_eq!(dom.observed(ObserverKind::Reveal), cards);

        let mut cx = services.context(Duration::ZERO);
        assert_eq!(reveal.handle(&mut dom, &seen(cards[1], false), &mut cx), Handled::No);
        assert_eq!(reveal.handle(&mut dom, &seen(cards[1], true), &mut cx), Handled::Yes);
        assert!(dom.has_class(&cards[1], "animated"));
        assert!(!dom.is_observed(cards[1], ObserverKind::Reveal));
        assert_eq!(reveal.pending().len(), 2);

        assert_eq!(reveal.handle(&mut dom, &seen(cards[1], true), &mut cx), Handled::No);
    }

    #[test]
    fn lazy_image_intersections_are_ignored() {
        let (mut dom, cards) = page();
        let (mut reveal, mut services) = boot(&mut dom, HostCapabilities::modern());
        let event = PageEvent::Intersection {
            target: cards[0],
            observer: ObserverKind::LazyImage,
            intersecting: true,
        };
        let handled = reveal.handle(&mut dom, &event, &mut services.context(Duration::ZERO));
        assert_eq!(handled, Handled::No);
        assert!(!dom.has_class(&cards[0], "animated"));
    }

    #[test]
    fn without_observer_everything_is_revealed() {
        let (mut dom, cards) = page();
        let (reveal, _) = boot(&mut dom, HostCapabilities::legacy());
        assert!(cards.iter().all(|c| dom.has_class(c, "animated")));
        assert!(reveal.pending().is_empty());
        assert!(dom.observed(ObserverKind::Reveal).is_empty());
    }
}
