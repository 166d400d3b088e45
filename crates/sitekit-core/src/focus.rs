#![forbid(unsafe_code)]

//! Keyboard focus containment.

use crate::dom::Dom;
use crate::event::{KeyCode, KeyInput};

/// Elements that can take keyboard focus.
pub const FOCUSABLE_SELECTOR: &str = "a[href], button, input, select, textarea, [tabindex]";

/// Focusable descendants of `container`, in tab order.
///
/// Disabled controls and `tabindex="-1"` elements are skipped.
pub fn focusable_within<D: Dom>(dom: &D, container: &D::Node) -> Vec<D::Node> {
    dom.query_within(container, FOCUSABLE_SELECTOR)
        .into_iter()
        .filter(|node| dom.attr(node, "disabled").is_none())
        .filter(|node| dom.attr(node, "tabindex").as_deref() != Some("-1"))
        .collect()
}

/// Confines Tab traversal to the focusable descendants of a container.
///
/// The trap only decides where focus must wrap; moving focus inside the
/// container is left to the browser. It is active for as long as its owner
/// keeps it installed and routes keydowns to [`FocusTrap::on_key`].
#[derive(Debug, Clone, PartialEq)]
pub struct FocusTrap<N> {
    container: N,
}

impl<N: Clone + PartialEq> FocusTrap<N> {
    pub fn new(container: N) -> Self {
        Self { container }
    }

    pub fn container(&self) -> &N {
        &self.container
    }

    /// Resolve a keydown inside the container.
    ///
    /// Returns the element that must receive focus when traversal wraps
    /// (Shift+Tab on the first element, Tab on the last). The caller focuses
    /// it and suppresses the default action. `None` leaves traversal alone.
    pub fn on_key<D: Dom<Node = N>>(&self, dom: &D, key: &KeyInput) -> Option<N> {
        let backwards = match key.code {
            KeyCode::Tab => false,
            KeyCode::BackTab => true,
            _ => return None,
        };
        let items = focusable_within(dom, &self.container);
        let (first, last) = (items.first()?, items.last()?);
        let active = dom.active_element();
        if backwards {
            (active.as_ref() == Some(first)).then(|| last.clone())
        } else {
            (active.as_ref() == Some(last)).then(|| first.clone())
        }
    }
}
