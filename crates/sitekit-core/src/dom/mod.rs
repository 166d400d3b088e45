#![forbid(unsafe_code)]

//! The host document, as seen by the widget controllers.
//!
//! [`Dom`] is the only way controllers touch the page. A browser host
//! implements it over `web-sys`; [`memory::MemoryDom`] implements it in
//! memory for tests and headless runs.
//!
//! Asynchronous services (visibility observation, image fetches, the
//! performance timeline) are requested through this trait and answered later
//! by the host as [`PageEvent`](crate::event::PageEvent) values.
//!
//! Selectors passed to query methods use the subset documented in
//! [`crate::selector`].

pub mod memory;

use std::fmt;

use crate::event::{ObserverKind, ResourceEntry};
use crate::geometry::{Rect, Viewport};

/// Mutable view of the host document.
pub trait Dom {
    /// Handle to an element. Cheap to clone.
    type Node: Clone + PartialEq + fmt::Debug;

    // -- Queries --------------------------------------------------------

    /// All elements matching `selector`, in document order.
    fn query_all(&self, selector: &str) -> Vec<Self::Node>;

    /// First element matching `selector`.
    fn query(&self, selector: &str) -> Option<Self::Node> {
        self.query_all(selector).into_iter().next()
    }

    /// Descendants of `root` matching `selector`, in document order.
    fn query_within(&self, root: &Self::Node, selector: &str) -> Vec<Self::Node>;

    /// Whether `node` matches `selector`.
    fn matches(&self, node: &Self::Node, selector: &str) -> bool;

    /// `node` or its nearest ancestor matching `selector`.
    fn closest(&self, node: &Self::Node, selector: &str) -> Option<Self::Node>;

    /// Whether `node` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: &Self::Node, node: &Self::Node) -> bool;

    /// Next sibling element.
    fn next_element_sibling(&self, node: &Self::Node) -> Option<Self::Node>;

    /// The `<body>` element.
    fn body(&self) -> Self::Node;

    // -- Tree mutation --------------------------------------------------

    /// Create a detached element.
    fn create_element(&mut self, tag: &str) -> Option<Self::Node>;

    /// Append `child` as the last child of `parent`.
    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node);

    /// Insert `child` as the first child of `parent`.
    fn prepend_child(&mut self, parent: &Self::Node, child: &Self::Node);

    /// Insert `node` right after `anchor`.
    fn insert_after(&mut self, anchor: &Self::Node, node: &Self::Node);

    /// Detach `node` from the document.
    fn remove(&mut self, node: &Self::Node);

    /// Replace the text content of `node`.
    fn set_text(&mut self, node: &Self::Node, text: &str);

    /// Text content of `node` and its descendants.
    fn text(&self, node: &Self::Node) -> String;

    // -- Attributes and classes -----------------------------------------

    fn attr(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn set_attr(&mut self, node: &Self::Node, name: &str, value: &str);

    fn remove_attr(&mut self, node: &Self::Node, name: &str);

    fn has_class(&self, node: &Self::Node, class: &str) -> bool;

    fn add_class(&mut self, node: &Self::Node, class: &str);

    fn remove_class(&mut self, node: &Self::Node, class: &str);

    /// Add or remove `class` depending on `on`.
    fn toggle_class(&mut self, node: &Self::Node, class: &str, on: bool) {
        if on {
            self.add_class(node, class);
        } else {
            self.remove_class(node, class);
        }
    }

    // -- Form controls --------------------------------------------------

    /// Current value of an input, textarea or select.
    fn value(&self, node: &Self::Node) -> String;

    fn set_disabled(&mut self, node: &Self::Node, disabled: bool);

    /// Restore every control of `form` to its default value.
    fn reset_form(&mut self, form: &Self::Node);

    // -- Focus ----------------------------------------------------------

    /// Focus `node` without scrolling it into view.
    fn focus(&mut self, node: &Self::Node);

    fn active_element(&self) -> Option<Self::Node>;

    // -- Geometry and scrolling -----------------------------------------

    /// Viewport-relative bounding box.
    fn rect(&self, node: &Self::Node) -> Rect;

    fn viewport(&self) -> Viewport;

    /// Vertical page scroll offset.
    fn scroll_y(&self) -> f64;

    /// Jump to a vertical scroll offset.
    fn scroll_to(&mut self, y: f64);

    /// Lock or unlock page scrolling on `<body>`.
    fn set_scroll_locked(&mut self, locked: bool);

    // -- Location -------------------------------------------------------

    /// `location.pathname`.
    fn location_path(&self) -> String;

    /// `location.hostname`.
    fn hostname(&self) -> String;

    // -- Host services --------------------------------------------------

    /// Start reporting visibility of `node` to the given observer.
    fn observe(&mut self, node: &Self::Node, kind: ObserverKind);

    /// Stop reporting visibility of `node`.
    fn unobserve(&mut self, node: &Self::Node, kind: ObserverKind);

    /// Fetch `src` out of band; the host answers with
    /// [`PageEvent::ImageSettled`](crate::event::PageEvent::ImageSettled).
    fn load_image(&mut self, node: &Self::Node, src: &str);

    /// Subscribe to layout-shift, paint and LCP timeline entries.
    fn observe_performance(&mut self);

    /// Completed resource loads so far.
    fn resource_entries(&self) -> Vec<ResourceEntry>;
}
