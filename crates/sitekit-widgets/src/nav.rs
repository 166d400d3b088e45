#![forbid(unsafe_code)]

//! Site navigation bar.
//!
//! Owns four behaviors of the navbar:
//!
//! - the mobile menu (open/closed, with scroll lock and a focus trap),
//! - the `scrolled` style once the page moves past a threshold,
//! - in-page anchor links that smooth-scroll below the fixed bar,
//! - marking the link for the current page.
//!
//! # Menu states
//!
//! | From | Trigger | To |
//! |------|---------|----|
//! | closed | toggle activated, [`Navigation::open`] | open |
//! | open | toggle activated, Escape, click outside, anchor link | closed |
//! | open | resize settles wider than the breakpoint | closed |
//!
//! Body scroll is locked exactly while the menu is open.

use serde::Deserialize;
use sitekit_core::dom::Dom;
use sitekit_core::event::{Handled, KeyCode, PageEvent};
use sitekit_core::focus::{FocusTrap, focusable_within};
use sitekit_core::timer::TimerId;
use sitekit_core::timing::{Debounce, Throttle};

use crate::context::{Context, Timer};
use crate::{Controller, ControllerKey, millis};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub navbar: String,
    pub toggle: String,
    pub menu: String,
    pub links: String,
    pub active_class: String,
    pub scrolled_class: String,
    /// Scroll offset past which the navbar is styled as scrolled.
    pub scrolled_threshold: f64,
    /// Viewport width above which the mobile menu cannot stay open.
    pub breakpoint: f64,
    pub scroll_throttle_ms: u64,
    pub resize_debounce_ms: u64,
    pub scroll_duration_ms: u64,
    pub opened_message: String,
    pub closed_message: String,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            navbar: ".navbar".into(),
            toggle: ".nav-toggle".into(),
            menu: ".nav-menu".into(),
            links: ".nav-link".into(),
            active_class: "active".into(),
            scrolled_class: "scrolled".into(),
            scrolled_threshold: 100.0,
            breakpoint: 768.0,
            scroll_throttle_ms: 100,
            resize_debounce_ms: 250,
            scroll_duration_ms: 800,
            opened_message: "Menu opened".into(),
            closed_message: "Menu closed".into(),
        }
    }
}

/// Navigation bar controller.
#[derive(Debug)]
pub struct Navigation<N> {
    config: NavigationConfig,
    navbar: N,
    toggle: Option<N>,
    menu: Option<N>,
    trap: Option<FocusTrap<N>>,
    scrolled: bool,
    scroll_gate: Throttle,
    resize_gate: Debounce,
    resize_timer: Option<TimerId>,
}

impl<N: Clone + PartialEq + std::fmt::Debug> Navigation<N> {
    /// Bind to the navbar, or `None` if the page has none.
    ///
    /// The menu toggle and panel are optional; without both the menu
    /// behaviors are inert.
    pub fn new<D: Dom<Node = N>>(dom: &mut D, config: NavigationConfig) -> Option<Self> {
        let navbar = dom.query(&config.navbar)?;
        let toggle = dom.query(&config.toggle);
        let menu = dom.query(&config.menu);
        if let Some(toggle) = &toggle {
            dom.set_attr(toggle, "aria-expanded", "false");
            if let Some(id) = menu.as_ref().and_then(|m| dom.attr(m, "id")) {
                dom.set_attr(toggle, "aria-controls", &id);
            }
        }
        let nav = Self {
            scroll_gate: Throttle::new(millis(config.scroll_throttle_ms)),
            resize_gate: Debounce::new(millis(config.resize_debounce_ms)),
            config,
            navbar,
            toggle,
            menu,
            trap: None,
            scrolled: false,
            resize_timer: None,
        };
        nav.mark_current_page(dom);
        Some(nav)
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.trap.is_some()
    }

    #[must_use]
    pub fn is_scrolled(&self) -> bool {
        self.scrolled
    }

    /// Open the mobile menu.
    pub fn open<D: Dom<Node = N>>(&mut self, dom: &mut D, cx: &mut Context<'_, N>) {
        let (Some(toggle), Some(menu)) = (self.toggle.clone(), self.menu.clone()) else {
            return;
        };
        if self.is_open() {
            return;
        }
        dom.add_class(&menu, &self.config.active_class);
        dom.add_class(&toggle, &self.config.active_class);
        dom.set_attr(&toggle, "aria-expanded", "true");
        dom.set_scroll_locked(true);
        let first = dom
            .query_within(&menu, &self.config.links)
            .into_iter()
            .next()
            .or_else(|| focusable_within(dom, &menu).into_iter().next());
        if let Some(first) = first {
            dom.focus(&first);
        }
        self.trap = Some(FocusTrap::new(menu));
        cx.announce(dom, &self.config.opened_message);
        tracing::debug!("navigation menu opened");
    }

    /// Close the mobile menu and hand focus back to the toggle.
    pub fn close<D: Dom<Node = N>>(&mut self, dom: &mut D, cx: &mut Context<'_, N>) {
        if self.trap.take().is_none() {
            return;
        }
        if let Some(menu) = &self.menu {
            dom.remove_class(menu, &self.config.active_class);
        }
        if let Some(toggle) = &self.toggle {
            dom.remove_class(toggle, &self.config.active_class);
            dom.set_attr(toggle, "aria-expanded", "false");
            dom.focus(toggle);
        }
        dom.set_scroll_locked(false);
        cx.announce(dom, &self.config.closed_message);
        tracing::debug!("navigation menu closed");
    }

    fn mark_current_page<D: Dom<Node = N>>(&self, dom: &mut D) {
        let path = dom.location_path();
        let current = page_name(&path);
        for link in dom.query_all(&self.config.links) {
            let Some(href) = dom.attr(&link, "href") else {
                continue;
            };
            if !href.starts_with('#') && page_name(&href) == current {
                dom.add_class(&link, &self.config.active_class);
                dom.set_attr(&link, "aria-current", "page");
            }
        }
    }

    fn on_click<D: Dom<Node = N>>(
        &mut self,
        dom: &mut D,
        target: &N,
        cx: &mut Context<'_, N>,
    ) -> Handled {
        if let Some(toggle) = &self.toggle
            && dom.contains(toggle, target)
        {
            if self.is_open() {
                self.close(dom, cx);
            } else {
                self.open(dom, cx);
            }
            return Handled::Yes;
        }

        if let Some(link) = dom.closest(target, "a[href^='#']")
            && let Some(destination) = anchor_target(dom, &link)
        {
            self.close(dom, cx);
            let offset = dom.rect(&self.navbar).height;
            cx.scroll_to_element(
                dom,
                &destination,
                offset,
                millis(self.config.scroll_duration_ms),
            );
            dom.set_attr(&destination, "tabindex", "-1");
            dom.focus(&destination);
            return Handled::PreventDefault;
        }

        if self.is_open()
            && let Some(menu) = self.menu.clone()
            && !dom.contains(&menu, target)
        {
            self.close(dom, cx);
            return Handled::Yes;
        }
        Handled::No
    }

    fn on_key<D: Dom<Node = N>>(
        &mut self,
        dom: &mut D,
        key: &sitekit_core::event::KeyInput,
        cx: &mut Context<'_, N>,
    ) -> Handled {
        let Some(trap) = &self.trap else {
            return Handled::No;
        };
        if key.code == KeyCode::Escape {
            self.close(dom, cx);
            return Handled::Yes;
        }
        match trap.on_key(dom, key) {
            Some(wrap_to) => {
                dom.focus(&wrap_to);
                Handled::PreventDefault
            }
            None => Handled::No,
        }
    }

    fn on_scroll<D: Dom<Node = N>>(&mut self, dom: &mut D, cx: &Context<'_, N>) -> Handled {
        if !self.scroll_gate.admit(cx.now()) {
            return Handled::No;
        }
        let scrolled = dom.scroll_y() > self.config.scrolled_threshold;
        if scrolled != self.scrolled {
            self.scrolled = scrolled;
            dom.toggle_class(&self.navbar, &self.config.scrolled_class, scrolled);
        }
        Handled::Yes
    }

    fn on_resize(&mut self, cx: &mut Context<'_, N>) {
        self.resize_gate.poll(cx.now());
        self.resize_gate.trigger(cx.now());
        if let Some(timer) = self.resize_timer.take() {
            cx.cancel(timer);
        }
        if let Some(deadline) = self.resize_gate.deadline() {
            self.resize_timer = Some(cx.schedule_at(deadline, Timer::ResizeSettled));
        }
    }

    fn on_resize_settled<D: Dom<Node = N>>(&mut self, dom: &mut D, cx: &mut Context<'_, N>) {
        self.resize_timer = None;
        if !self.resize_gate.poll(cx.now()) {
            return;
        }
        if self.is_open() && dom.viewport().width > self.config.breakpoint {
            self.close(dom, cx);
        }
    }
}

impl<D: Dom> Controller<D> for Navigation<D::Node> {
    fn key(&self) -> ControllerKey {
        ControllerKey::Navigation
    }

    fn handle(
        &mut self,
        dom: &mut D,
        event: &PageEvent<D::Node>,
        cx: &mut Context<'_, D::Node>,
    ) -> Handled {
        match event {
            PageEvent::Click { target } => self.on_click(dom, target, cx),
            PageEvent::KeyDown { key, .. } => self.on_key(dom, key, cx),
            PageEvent::Scroll => self.on_scroll(dom, cx),
            PageEvent::Resize => {
                self.on_resize(cx);
                Handled::Yes
            }
            _ => Handled::No,
        }
    }

    fn on_timer(&mut self, dom: &mut D, timer: Timer<D::Node>, cx: &mut Context<'_, D::Node>) {
        if matches!(timer, Timer::ResizeSettled) {
            self.on_resize_settled(dom, cx);
        }
    }
}

/// Last path segment, with the site root standing for `index.html`.
fn page_name(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    match path.rsplit('/').next() {
        Some("") | None => "index.html",
        Some(segment) => segment,
    }
}

/// Element an in-page link points at. Bare `#` points nowhere.
fn anchor_target<D: Dom>(dom: &D, link: &D::Node) -> Option<D::Node> {
    let href = dom.attr(link, "href")?;
    let id = href.strip_prefix('#')?;
    if id.is_empty() {
        return None;
    }
    dom.query(&format!("#{id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Announcer, Services};
    use sitekit_core::capabilities::HostCapabilities;
    use sitekit_core::dom::memory::{MemoryDom, NodeId};
    use sitekit_core::event::{KeyInput, Modifiers};
    use sitekit_core::geometry::{Rect, Viewport};
    use std::time::Duration;

    struct Page {
        dom: MemoryDom,
        navbar: NodeId,
        toggle: NodeId,
        menu: NodeId,
        links: Vec<NodeId>,
        about: NodeId,
        outside: NodeId,
    }

    fn page(path: &str) -> Page {
        let mut dom = MemoryDom::new();
        dom.set_location(path, "example.com");
        let body = dom.body();
        let navbar = dom.add(body, "nav", &[("class", "navbar")]);
        dom.set_rect(navbar, Rect::new(0.0, 0.0, 1280.0, 70.0));
        let toggle = dom.add(navbar, "button", &[("class", "nav-toggle")]);
        let menu = dom.add(navbar, "ul", &[("class", "nav-menu"), ("id", "menu")]);
        let links = ["index.html", "services.html", "#about", "#"]
            .iter()
            .map(|href| dom.add(menu, "a", &[("class", "nav-link"), ("href", href)]))
            .collect();
        let about = dom.add(body, "section", &[("id", "about")]);
        dom.set_rect(about, Rect::new(0.0, 1_200.0, 1280.0, 600.0));
        let outside = dom.add(body, "main", &[]);
        Page {
            dom,
            navbar,
            toggle,
            menu,
            links,
            about,
            outside,
        }
    }

    struct Harness {
        nav: Navigation<NodeId>,
        services: Services<NodeId>,
    }

    impl Harness {
        fn new(dom: &mut MemoryDom) -> Self {
            let mut services = Services::new(HostCapabilities::modern());
            services.install_announcer(Announcer::install(dom).expect("announcer"));
            let nav = Navigation::new(dom, NavigationConfig::default()).expect("navbar");
            Self { nav, services }
        }

        fn send(&mut self, dom: &mut MemoryDom, now: u64, event: PageEvent<NodeId>) -> Handled {
            self.nav
                .handle(dom, &event, &mut self.services.context(millis(now)))
        }

        fn run_timers(&mut self, dom: &mut MemoryDom, now: u64) {
            while let Some(timer) = self.services.pop_due(millis(now)) {
                self.nav
                    .on_timer(dom, timer, &mut self.services.context(millis(now)));
            }
        }

        fn announced(&self, dom: &MemoryDom) -> String {
            dom.text(self.services.announcer().expect("announcer").region())
        }
    }

    fn click(target: NodeId) -> PageEvent<NodeId> {
        PageEvent::Click { target }
    }

    fn key(target: NodeId, code: KeyCode) -> PageEvent<NodeId> {
        PageEvent::KeyDown {
            target,
            key: KeyInput::new(code),
        }
    }

    #[test]
    fn page_without_navbar_is_skipped() {
        let mut dom = MemoryDom::new();
        assert!(Navigation::new(&mut dom, NavigationConfig::default()).is_none());
    }

    #[test]
    fn toggle_opens_and_closes_menu() {
        let mut p = page("/");
        let mut h = Harness::new(&mut p.dom);
        assert_eq!(p.dom.attr(&p.toggle, "aria-expanded").as_deref(), Some("false"));
        assert_eq!(p.dom.attr(&p.toggle, "aria-controls").as_deref(), Some("menu"));

        assert_eq!(h.send(&mut p.dom, 0, click(p.toggle)), Handled::Yes);
        assert!(h.nav.is_open());
        assert!(p.dom.scroll_locked());
        assert!(p.dom.has_class(&p.menu, "active"));
        assert!(p.dom.has_class(&p.toggle, "active"));
        assert_eq!(p.dom.attr(&p.toggle, "aria-expanded").as_deref(), Some("true"));
        assert_eq!(p.dom.active_element(), Some(p.links[0]));
        assert_eq!(h.announced(&p.dom), "Menu opened");

        h.send(&mut p.dom, 10, click(p.toggle));
        assert!(!h.nav.is_open());
        assert!(!p.dom.scroll_locked());
        assert!(!p.dom.has_class(&p.menu, "active"));
        assert_eq!(p.dom.attr(&p.toggle, "aria-expanded").as_deref(), Some("false"));
        assert_eq!(p.dom.active_element(), Some(p.toggle));
        assert_eq!(h.announced(&p.dom), "Menu closed");
    }

    #[test]
    fn escape_closes_menu() {
        let mut p = page("/");
        let mut h = Harness::new(&mut p.dom);
        h.send(&mut p.dom, 0, click(p.toggle));
        assert_eq!(h.send(&mut p.dom, 5, key(p.links[0], KeyCode::Escape)), Handled::Yes);
        assert!(!h.nav.is_open());
    }

    #[test]
    fn escape_with_menu_closed_is_ignored() {
        let mut p = page("/");
        let mut h = Harness::new(&mut p.dom);
        assert_eq!(h.send(&mut p.dom, 0, key(p.outside, KeyCode::Escape)), Handled::No);
    }

    #[test]
    fn click_outside_closes_menu() {
        let mut p = page("/");
        let mut h = Harness::new(&mut p.dom);
        h.send(&mut p.dom, 0, click(p.toggle));
        h.send(&mut p.dom, 5, click(p.links[1]));
        assert!(h.nav.is_open());
        h.send(&mut p.dom, 10, click(p.outside));
        assert!(!h.nav.is_open());
        assert!(!p.dom.scroll_locked());
    }

    #[test]
    fn tab_wraps_inside_open_menu() {
        let mut p = page("/");
        let mut h = Harness::new(&mut p.dom);
        h.send(&mut p.dom, 0, click(p.toggle));
        let last = *p.links.last().expect("links");
        p.dom.focus(&last);
        assert_eq!(h.send(&mut p.dom, 5, key(last, KeyCode::Tab)), Handled::PreventDefault);
        assert_eq!(p.dom.active_element(), Some(p.links[0]));

        let back = PageEvent::KeyDown {
            target: p.links[0],
            key: KeyInput::new(KeyCode::Tab).with_mods(Modifiers::SHIFT),
        };
        assert_eq!(h.send(&mut p.dom, 6, back), Handled::PreventDefault);
        assert_eq!(p.dom.active_element(), Some(last));
    }

    #[test]
    fn anchor_link_scrolls_below_navbar_and_focuses_target() {
        let mut p = page("/");
        let mut h = Harness::new(&mut p.dom);
        h.send(&mut p.dom, 0, click(p.toggle));

        assert_eq!(h.send(&mut p.dom, 100, click(p.links[2])), Handled::PreventDefault);
        assert!(!h.nav.is_open());
        assert_eq!(p.dom.attr(&p.about, "tabindex").as_deref(), Some("-1"));
        assert_eq!(p.dom.active_element(), Some(p.about));

        assert!(h.services.advance_scroll(&mut p.dom, millis(100)));
        assert!(!h.services.advance_scroll(&mut p.dom, millis(900)));
        assert_eq!(p.dom.scroll_y(), 1_130.0);
    }

    #[test]
    fn bare_hash_link_is_left_alone() {
        let mut p = page("/");
        let mut h = Harness::new(&mut p.dom);
        assert_eq!(h.send(&mut p.dom, 0, click(p.links[3])), Handled::No);
        assert!(!h.services.scroll_in_flight());
    }

    #[test]
    fn scroll_past_threshold_marks_navbar() {
        let mut p = page("/");
        let mut h = Harness::new(&mut p.dom);
        p.dom.scroll_to(150.0);
        h.send(&mut p.dom, 0, PageEvent::Scroll);
        assert!(h.nav.is_scrolled());
        assert!(p.dom.has_class(&p.navbar, "scrolled"));

        // Inside the throttle window the change is not seen.
        p.dom.scroll_to(0.0);
        assert_eq!(h.send(&mut p.dom, 50, PageEvent::Scroll), Handled::No);
        assert!(p.dom.has_class(&p.navbar, "scrolled"));

        h.send(&mut p.dom, 100, PageEvent::Scroll);
        assert!(!p.dom.has_class(&p.navbar, "scrolled"));
    }

    #[test]
    fn settled_wide_resize_closes_menu() {
        let mut p = page("/");
        let mut h = Harness::new(&mut p.dom);
        h.send(&mut p.dom, 0, click(p.toggle));

        p.dom.set_viewport(Viewport::new(1024.0, 768.0));
        h.send(&mut p.dom, 1_000, PageEvent::Resize);
        h.send(&mut p.dom, 1_200, PageEvent::Resize);
        h.run_timers(&mut p.dom, 1_250);
        assert!(h.nav.is_open());
        assert_eq!(h.services.next_deadline(), Some(millis(1_450)));

        h.run_timers(&mut p.dom, 1_450);
        assert!(!h.nav.is_open());
        assert_eq!(h.services.pending_timers(), 0);
    }

    #[test]
    fn narrow_resize_keeps_menu_open() {
        let mut p = page("/");
        let mut h = Harness::new(&mut p.dom);
        h.send(&mut p.dom, 0, click(p.toggle));
        p.dom.set_viewport(Viewport::new(375.0, 667.0));
        h.send(&mut p.dom, 0, PageEvent::Resize);
        h.run_timers(&mut p.dom, 250);
        assert!(h.nav.is_open());
    }

    #[test]
    fn current_page_link_is_marked() {
        let mut p = page("/services.html");
        Harness::new(&mut p.dom);
        assert!(p.dom.has_class(&p.links[1], "active"));
        assert_eq!(p.dom.attr(&p.links[1], "aria-current").as_deref(), Some("page"));
        assert!(!p.dom.has_class(&p.links[0], "active"));
    }

    #[test]
    fn site_root_marks_index_link() {
        let mut p = page("/");
        Harness::new(&mut p.dom);
        assert!(p.dom.has_class(&p.links[0], "active"));
        assert!(!p.dom.has_class(&p.links[2], "active"));
    }

    #[test]
    fn page_names() {
        assert_eq!(page_name("/"), "index.html");
        assert_eq!(page_name(""), "index.html");
        assert_eq!(page_name("/blog/post.html"), "post.html");
        assert_eq!(page_name("about.html?x=1"), "about.html");
        assert_eq!(page_name("/docs/"), "index.html");
    }

    #[test]
    fn menu_without_toggle_stays_closed() {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        dom.add(body, "nav", &[("class", "navbar")]);
        let mut services = Services::new(HostCapabilities::modern());
        let mut nav = Navigation::new(&mut dom, NavigationConfig::default()).expect("navbar");
        nav.open(&mut dom, &mut services.context(Duration::ZERO));
        assert!(!nav.is_open());
        assert!(!dom.scroll_locked());
    }
}
