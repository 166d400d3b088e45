#![forbid(unsafe_code)]

//! In-memory document for tests and headless runs.
//!
//! `MemoryDom` keeps a small element tree rooted at `<body>`, a scroll
//! offset, a viewport, focus, and a log of the host services the controllers
//! requested (observations, image loads). Layout is not computed: tests
//! assign document-space rectangles with [`MemoryDom::set_rect`] and
//! [`Dom::rect`] reports them relative to the current scroll offset.
//!
//! # Example
//!
//! ```
//! use sitekit_core::dom::Dom;
//! use sitekit_core::dom::memory::MemoryDom;
//!
//! let mut dom = MemoryDom::new();
//! let body = dom.body();
//! let nav = dom.add(body, "nav", &[("class", "navbar")]);
//! dom.add(nav, "a", &[("class", "nav-link"), ("href", "#about")]);
//!
//! assert_eq!(dom.query_all(".navbar a[href^='#']").len(), 1);
//! ```

use crate::dom::Dom;
use crate::event::{ObserverKind, ResourceEntry};
use crate::geometry::{Rect, Viewport};
use crate::selector::{ElementView, SelectorList};

/// Handle to a [`MemoryDom`] element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct NodeData {
    tag: String,
    attrs: Vec<(String, String)>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    text: String,
    value: String,
    default_value: String,
    rect: Rect,
}

impl NodeData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            parent: None,
            children: Vec::new(),
            text: String::new(),
            value: String::new(),
            default_value: String::new(),
            rect: Rect::default(),
        }
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn set_attr(&mut self, name: &str, value: &str) {
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attrs.push((name.to_string(), value.to_string())),
        }
    }

    fn is_control(&self) -> bool {
        matches!(self.tag.as_str(), "input" | "textarea" | "select")
    }
}

#[derive(Clone, Copy)]
struct View<'a> {
    dom: &'a MemoryDom,
    id: NodeId,
}

impl ElementView for View<'_> {
    fn tag(&self) -> &str {
        &self.dom.node(self.id).tag
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.dom.node(self.id).attr(name)
    }

    fn parent(&self) -> Option<Self> {
        self.dom.node(self.id).parent.map(|id| View { dom: self.dom, id })
    }
}

/// An element tree plus the page state the controllers read and write.
#[derive(Debug, Clone)]
pub struct MemoryDom {
    nodes: Vec<NodeData>,
    body: NodeId,
    focused: Option<NodeId>,
    scroll_y: f64,
    viewport: Viewport,
    scroll_locked: bool,
    path: String,
    hostname: String,
    observed: Vec<(NodeId, ObserverKind)>,
    image_requests: Vec<(NodeId, String)>,
    performance_observed: bool,
    resources: Vec<ResourceEntry>,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    /// Empty `<body>`, 1280x800 viewport, `/` on `example.com`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData::new("body")],
            body: NodeId(0),
            focused: None,
            scroll_y: 0.0,
            viewport: Viewport::new(1280.0, 800.0),
            scroll_locked: false,
            path: "/".to_string(),
            hostname: "example.com".to_string(),
            observed: Vec::new(),
            image_requests: Vec::new(),
            performance_observed: false,
            resources: Vec::new(),
        }
    }

    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0]
    }

    fn view(&self, id: NodeId) -> View<'_> {
        View { dom: self, id }
    }

    /// Append a new element under `parent`.
    ///
    /// A `value` attribute also becomes the control's default value.
    pub fn add(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let id = NodeId(self.nodes.len());
        let mut data = NodeData::new(tag);
        for (name, value) in attrs {
            data.set_attr(name, value);
            if *name == "value" {
                data.value = (*value).to_string();
                data.default_value = (*value).to_string();
            }
        }
        self.nodes.push(data);
        self.attach_last(parent, id);
        id
    }

    /// Tag name of `node`.
    #[must_use]
    pub fn tag(&self, node: NodeId) -> &str {
        &self.node(node).tag
    }

    /// Set the document-space bounding box of `node`.
    pub fn set_rect(&mut self, node: NodeId, rect: Rect) {
        self.node_mut(node).rect = rect;
    }

    /// Simulate the user editing a control.
    pub fn set_value(&mut self, node: NodeId, value: &str) {
        self.node_mut(node).value = value.to_string();
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn set_location(&mut self, path: &str, hostname: &str) {
        self.path = path.to_string();
        self.hostname = hostname.to_string();
    }

    /// Record a completed resource load.
    pub fn push_resource(&mut self, entry: ResourceEntry) {
        self.resources.push(entry);
    }

    /// Whether `<body>` scrolling is locked.
    #[must_use]
    pub fn scroll_locked(&self) -> bool {
        self.scroll_locked
    }

    /// Whether `node` is currently observed by `kind`.
    #[must_use]
    pub fn is_observed(&self, node: NodeId, kind: ObserverKind) -> bool {
        self.observed.contains(&(node, kind))
    }

    /// Nodes currently observed by `kind`.
    #[must_use]
    pub fn observed(&self, kind: ObserverKind) -> Vec<NodeId> {
        self.observed
            .iter()
            .filter(|(_, k)| *k == kind)
            .map(|(node, _)| *node)
            .collect()
    }

    /// Every image load requested so far, in order.
    #[must_use]
    pub fn image_requests(&self) -> &[(NodeId, String)] {
        &self.image_requests
    }

    #[must_use]
    pub fn performance_observed(&self) -> bool {
        self.performance_observed
    }

    /// Whether `node` is reachable from `<body>`.
    #[must_use]
    pub fn is_attached(&self, node: NodeId) -> bool {
        self.contains(&self.body, &node)
    }

    fn attach_last(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.node_mut(node).parent.take() {
            self.node_mut(parent).children.retain(|&c| c != node);
        }
    }

    fn descendants(&self, root: NodeId, out: &mut Vec<NodeId>) {
        for &child in &self.node(root).children {
            out.push(child);
            self.descendants(child, out);
        }
    }

    fn select(&self, candidates: Vec<NodeId>, selector: &str) -> Vec<NodeId> {
        let Ok(list) = SelectorList::parse(selector) else {
            return Vec::new();
        };
        candidates
            .into_iter()
            .filter(|&id| list.matches(&self.view(id)))
            .collect()
    }
}

impl Dom for MemoryDom {
    type Node = NodeId;

    fn query_all(&self, selector: &str) -> Vec<NodeId> {
        let mut all = vec![self.body];
        self.descendants(self.body, &mut all);
        self.select(all, selector)
    }

    fn query_within(&self, root: &NodeId, selector: &str) -> Vec<NodeId> {
        let mut all = Vec::new();
        self.descendants(*root, &mut all);
        self.select(all, selector)
    }

    fn matches(&self, node: &NodeId, selector: &str) -> bool {
        SelectorList::parse(selector).is_ok_and(|list| list.matches(&self.view(*node)))
    }

    fn closest(&self, node: &NodeId, selector: &str) -> Option<NodeId> {
        let list = SelectorList::parse(selector).ok()?;
        let mut cursor = Some(*node);
        while let Some(id) = cursor {
            if list.matches(&self.view(id)) {
                return Some(id);
            }
            cursor = self.node(id).parent;
        }
        None
    }

    fn contains(&self, ancestor: &NodeId, node: &NodeId) -> bool {
        let mut cursor = Some(*node);
        while let Some(id) = cursor {
            if id == *ancestor {
                return true;
            }
            cursor = self.node(id).parent;
        }
        false
    }

    fn next_element_sibling(&self, node: &NodeId) -> Option<NodeId> {
        let parent = self.node(*node).parent?;
        let siblings = &self.node(parent).children;
        let idx = siblings.iter().position(|c| c == node)?;
        siblings.get(idx + 1).copied()
    }

    fn body(&self) -> NodeId {
        self.body
    }

    fn create_element(&mut self, tag: &str) -> Option<NodeId> {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData::new(tag));
        Some(id)
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) {
        self.attach_last(*parent, *child);
    }

    fn prepend_child(&mut self, parent: &NodeId, child: &NodeId) {
        self.detach(*child);
        self.node_mut(*child).parent = Some(*parent);
        self.node_mut(*parent).children.insert(0, *child);
    }

    fn insert_after(&mut self, anchor: &NodeId, node: &NodeId) {
        let Some(parent) = self.node(*anchor).parent else {
            return;
        };
        self.detach(*node);
        let siblings = &mut self.node_mut(parent).children;
        let idx = siblings
            .iter()
            .position(|c| c == anchor)
            .map_or(siblings.len(), |i| i + 1);
        siblings.insert(idx, *node);
        self.node_mut(*node).parent = Some(parent);
    }

    fn remove(&mut self, node: &NodeId) {
        if let Some(focused) = self.focused
            && self.contains(node, &focused)
        {
            self.focused = None;
        }
        self.detach(*node);
    }

    fn set_text(&mut self, node: &NodeId, text: &str) {
        let children = std::mem::take(&mut self.node_mut(*node).children);
        for child in children {
            self.node_mut(child).parent = None;
        }
        self.node_mut(*node).text = text.to_string();
    }

    fn text(&self, node: &NodeId) -> String {
        let mut out = self.node(*node).text.clone();
        for child in &self.node(*node).children {
            out.push_str(&self.text(child));
        }
        out
    }

    fn attr(&self, node: &NodeId, name: &str) -> Option<String> {
        self.node(*node).attr(name).map(str::to_string)
    }

    fn set_attr(&mut self, node: &NodeId, name: &str, value: &str) {
        self.node_mut(*node).set_attr(name, value);
    }

    fn remove_attr(&mut self, node: &NodeId, name: &str) {
        self.node_mut(*node).attrs.retain(|(k, _)| k != name);
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        self.view(*node).has_class(class)
    }

    fn add_class(&mut self, node: &NodeId, class: &str) {
        if self.has_class(node, class) {
            return;
        }
        let list = match self.node(*node).attr("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_string(),
        };
        self.node_mut(*node).set_attr("class", &list);
    }

    fn remove_class(&mut self, node: &NodeId, class: &str) {
        let Some(existing) = self.node(*node).attr("class") else {
            return;
        };
        let list = existing
            .split_whitespace()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.node_mut(*node).set_attr("class", &list);
    }

    fn value(&self, node: &NodeId) -> String {
        self.node(*node).value.clone()
    }

    fn set_disabled(&mut self, node: &NodeId, disabled: bool) {
        if disabled {
            self.set_attr(node, "disabled", "");
        } else {
            self.remove_attr(node, "disabled");
        }
    }

    fn reset_form(&mut self, form: &NodeId) {
        let mut all = Vec::new();
        self.descendants(*form, &mut all);
        for id in all {
            let data = self.node_mut(id);
            if data.is_control() {
                data.value = data.default_value.clone();
            }
        }
    }

    fn focus(&mut self, node: &NodeId) {
        self.focused = Some(*node);
    }

    fn active_element(&self) -> Option<NodeId> {
        self.focused
    }

    fn rect(&self, node: &NodeId) -> Rect {
        self.node(*node).rect.offset(0.0, -self.scroll_y)
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    fn scroll_to(&mut self, y: f64) {
        self.scroll_y = y.max(0.0);
    }

    fn set_scroll_locked(&mut self, locked: bool) {
        self.scroll_locked = locked;
    }

    fn location_path(&self) -> String {
        self.path.clone()
    }

    fn hostname(&self) -> String {
        self.hostname.clone()
    }

    fn observe(&mut self, node: &NodeId, kind: ObserverKind) {
        if !self.observed.contains(&(*node, kind)) {
            self.observed.push((*node, kind));
        }
    }

    fn unobserve(&mut self, node: &NodeId, kind: ObserverKind) {
        self.observed.retain(|entry| *entry != (*node, kind));
    }

    fn load_image(&mut self, node: &NodeId, src: &str) {
        self.image_requests.push((*node, src.to_string()));
    }

    fn observe_performance(&mut self) {
        self.performance_observed = true;
    }

    fn resource_entries(&self) -> Vec<ResourceEntry> {
        self.resources.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> (MemoryDom, NodeId, NodeId, NodeId) {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        let form = dom.add(body, "form", &[("novalidate", "")]);
        let name = dom.add(form, "input", &[("name", "name"), ("value", "Ada")]);
        let email = dom.add(form, "input", &[("name", "email"), ("type", "email")]);
        (dom, form, name, email)
    }

    #[test]
    fn queries_follow_document_order() {
        let (dom, form, name, email) = page();
        assert_eq!(dom.query_all("input"), vec![name, email]);
        assert_eq!(dom.query_within(&form, "[name]"), vec![name, email]);
        assert_eq!(dom.query("input[type=email]"), Some(email));
        assert!(dom.query_all("input >").is_empty());
    }

    #[test]
    fn insert_after_and_remove() {
        let (mut dom, form, name, email) = page();
        let msg = dom.create_element("span").unwrap();
        dom.insert_after(&name, &msg);
        assert_eq!(dom.next_element_sibling(&name), Some(msg));
        assert_eq!(dom.next_element_sibling(&msg), Some(email));
        dom.remove(&msg);
        assert!(!dom.is_attached(msg));
        assert_eq!(dom.query_within(&form, "span"), vec![]);
    }

    #[test]
    fn class_list_manipulation() {
        let (mut dom, _, name, _) = page();
        dom.add_class(&name, "error");
        dom.add_class(&name, "error");
        dom.add_class(&name, "wide");
        assert_eq!(dom.attr(&name, "class").as_deref(), Some("error wide"));
        dom.toggle_class(&name, "error", false);
        assert!(!dom.has_class(&name, "error"));
        assert!(dom.matches(&name, ".wide"));
    }

    #[test]
    fn reset_restores_default_values() {
        let (mut dom, form, name, email) = page();
        dom.set_value(name, "Grace");
        dom.set_value(email, "grace@example.com");
        dom.reset_form(&form);
        assert_eq!(dom.value(&name), "Ada");
        assert_eq!(dom.value(&email), "");
    }

    #[test]
    fn rect_is_relative_to_scroll_offset() {
        let (mut dom, form, _, _) = page();
        dom.set_rect(form, Rect::new(0.0, 1000.0, 600.0, 400.0));
        dom.scroll_to(250.0);
        assert_eq!(dom.rect(&form).top(), 750.0);
        dom.scroll_to(-10.0);
        assert_eq!(dom.scroll_y(), 0.0);
    }

    #[test]
    fn removing_focused_subtree_clears_focus() {
        let (mut dom, form, name, _) = page();
        dom.focus(&name);
        dom.remove(&form);
        assert_eq!(dom.active_element(), None);
    }

    #[test]
    fn set_text_replaces_children() {
        let (mut dom, form, _, _) = page();
        dom.set_text(&form, "Thanks");
        assert_eq!(dom.text(&form), "Thanks");
        assert!(dom.query_within(&form, "input").is_empty());
    }

    #[test]
    fn closest_includes_self() {
        let (dom, form, name, _) = page();
        assert_eq!(dom.closest(&name, "input"), Some(name));
        assert_eq!(dom.closest(&name, "form"), Some(form));
        assert_eq!(dom.closest(&name, ".missing"), None);
    }
}
