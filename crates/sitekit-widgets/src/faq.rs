#![forbid(unsafe_code)]

//! Single-open FAQ accordion.
//!
//! Each item pairs a question (the activator) with an answer panel.
//! Activating a question collapses every other item and toggles its own, so
//! at most one item is ever expanded.

use serde::Deserialize;
use sitekit_core::dom::Dom;
use sitekit_core::event::{Handled, PageEvent};

use crate::context::Context;
use crate::{Controller, ControllerKey};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FaqConfig {
    pub item: String,
    pub question: String,
    pub answer: String,
    pub active_class: String,
}

impl Default for FaqConfig {
    fn default() -> Self {
        Self {
            item: ".faq-item".into(),
            question: ".faq-question".into(),
            answer: ".faq-answer".into(),
            active_class: "active".into(),
        }
    }
}

#[derive(Debug)]
struct Item<N> {
    item: N,
    question: N,
    expanded: bool,
}

#[derive(Debug)]
pub struct Faq<N> {
    config: FaqConfig,
    items: Vec<Item<N>>,
}

impl<N: Clone + PartialEq> Faq<N> {
    /// Wire up every item that has a question, or `None` if there are none.
    pub fn new<D: Dom<Node = N>>(dom: &mut D, config: FaqConfig) -> Option<Self> {
        let mut items = Vec::new();
        for (idx, item) in dom.query_all(&config.item).into_iter().enumerate() {
            let Some(question) = dom.query_within(&item, &config.question).into_iter().next()
            else {
                continue;
            };
            dom.set_attr(&question, "aria-expanded", "false");
            if !dom.matches(&question, "button") {
                dom.set_attr(&question, "tabindex", "0");
            }
            dom.set_attr(&question, "role", "button");
            if let Some(answer) = dom.query_within(&item, &config.answer).into_iter().next() {
                let id = match dom.attr(&answer, "id") {
                    Some(id) if !id.is_empty() => id,
                    _ => {
                        let id = format!("faq-answer-{idx}");
                        dom.set_attr(&answer, "id", &id);
                        id
                    }
                };
                dom.set_attr(&question, "aria-controls", &id);
            }
            items.push(Item {
                item,
                question,
                expanded: false,
            });
        }
        if items.is_empty() {
            return None;
        }
        Some(Self { config, items })
    }

    /// Expanded flag of every item, in document order.
    #[must_use]
    pub fn expanded(&self) -> Vec<bool> {
        self.items.iter().map(|i| i.expanded).collect()
    }

    /// Activate the item at `idx`: collapse the others, toggle this one.
    pub fn activate<D: Dom<Node = N>>(&mut self, dom: &mut D, idx: usize) {
        let Some(was_expanded) = self.items.get(idx).map(|i| i.expanded) else {
            return;
        };
        for (i, item) in self.items.iter_mut().enumerate() {
            let expanded = i == idx && !was_expanded;
            if item.expanded == expanded && i != idx {
                continue;
            }
            item.expanded = expanded;
            dom.toggle_class(&item.item, &self.config.active_class, expanded);
            dom.set_attr(
                &item.question,
                "aria-expanded",
                if expanded { "true" } else { "false" },
            );
        }
    }

    fn question_index<D: Dom<Node = N>>(&self, dom: &D, target: &N) -> Option<usize> {
        let question = dom.closest(target, &self.config.question)?;
        self.items.iter().position(|i| i.question == question)
    }
}

impl<D: Dom> Controller<D> for Faq<D::Node> {
    fn key(&self) -> ControllerKey {
        ControllerKey::Faq
    }

    fn handle(
        &mut self,
        dom: &mut D,
        event: &PageEvent<D::Node>,
        _cx: &mut Context<'_, D::Node>,
    ) -> Handled {
        match event {
            PageEvent::Click { target } => match self.question_index(dom, target) {
                Some(idx) => {
                    self.activate(dom, idx);
                    Handled::Yes
                }
                None => Handled::No,
            },
            PageEvent::KeyDown { target, key } if key.code.is_activation() => {
                match self.question_index(dom, target) {
                    Some(idx) => {
                        self.activate(dom, idx);
                        Handled::PreventDefault
                    }
                    None => Handled::No,
                }
            }
            _ => Handled::No,
        }
    }
}
