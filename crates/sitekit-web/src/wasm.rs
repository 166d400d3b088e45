#![forbid(unsafe_code)]

//! Browser frontend.
//!
//! [`WebDom`] implements [`Dom`] over `web-sys`. [`Host`] owns the booted
//! [`App`] and turns DOM events, observer callbacks, image loads, and
//! `setTimeout`/`requestAnimationFrame` wake-ups into calls on it.
//!
//! # Re-entrancy
//!
//! DOM mutations made during a dispatch can synchronously fire further
//! events (focusing an element fires `focusout` on the previous one). Such
//! events find the app already borrowed; they are queued and dispatched
//! once the current dispatch returns. Their default action cannot be
//! prevented.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::{Rc, Weak};
use std::time::Duration;

use js_sys::{Array, Function, Object, Reflect};
use sitekit_core::capabilities::HostCapabilities;
use sitekit_core::clock::DeterministicClock;
use sitekit_core::dom::Dom;
use sitekit_core::event::{
    Handled, ImageLoadError, Modifiers, ObserverKind, PageError, PageEvent, PerfEntry,
    ResourceEntry, normalize_dom_key,
};
use sitekit_core::geometry::{Rect, Viewport};
use sitekit_widgets::form::SimulatedTransport;
use tracing::Level;
use tracing_subscriber::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    AddEventListenerOptions, Document, Element, ErrorEvent, Event, EventTarget, FocusOptions,
    HtmlElement, HtmlFormElement, HtmlImageElement, HtmlInputElement, HtmlSelectElement,
    HtmlTextAreaElement, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit,
    KeyboardEvent, Node, NodeList, PerformanceEntry, PerformanceObserver,
    PerformanceObserverEntryList, PerformanceResourceTiming, PromiseRejectionEvent, Window,
};

use crate::config::{ConfigError, LogConfig, SiteConfig};
use crate::logging::{ConsoleLayer, ConsoleSink};
use crate::{App, WebHostError};

// ============================================================================
// Helpers
// ============================================================================

fn describe(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    js_sys::JSON::stringify(value)
        .ok()
        .and_then(|json| json.as_string())
        .unwrap_or_else(|| format!("{value:?}"))
}

fn js_err(value: JsValue) -> WebHostError {
    WebHostError::Js(describe(&value))
}

fn elements(list: &NodeList) -> Vec<Element> {
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

fn event_element(event: &Event) -> Option<Element> {
    event.target()?.dyn_into::<Element>().ok()
}

fn detect_capabilities(window: &Window) -> HostCapabilities {
    let has = |target: &JsValue, name: &str| {
        Reflect::has(target, &JsValue::from_str(name)).unwrap_or(false)
    };
    let resource_timing = window
        .performance()
        .is_some_and(|performance| has(&performance, "getEntriesByType"));
    HostCapabilities {
        intersection_observer: has(window, "IntersectionObserver"),
        performance_observer: has(window, "PerformanceObserver"),
        resource_timing,
    }
}

fn perf_entry(value: &JsValue) -> Option<PerfEntry> {
    let entry = value.dyn_ref::<PerformanceEntry>()?;
    let field = |key: &str| Reflect::get(value, &JsValue::from_str(key)).ok();
    let number = |key: &str| field(key).and_then(|v| v.as_f64());
    match entry.entry_type().as_str() {
        "layout-shift" => Some(PerfEntry::LayoutShift {
            value: number("value")?,
            had_recent_input: field("hadRecentInput")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
        }),
        "paint" => Some(PerfEntry::Paint {
            name: entry.name(),
            start_time_ms: entry.start_time(),
        }),
        "largest-contentful-paint" => {
            let render_time_ms = number("renderTime")
                .filter(|t| *t > 0.0)
                .or_else(|| number("loadTime"))?;
            Some(PerfEntry::LargestContentfulPaint { render_time_ms })
        }
        _ => None,
    }
}

// ============================================================================
// Console logging
// ============================================================================

struct BrowserConsole;

impl ConsoleSink for BrowserConsole {
    fn write(&self, level: Level, line: &str) {
        let line = JsValue::from_str(line);
        match level {
            Level::ERROR => web_sys::console::error_1(&line),
            Level::WARN => web_sys::console::warn_1(&line),
            Level::INFO => web_sys::console::info_1(&line),
            _ => web_sys::console::debug_1(&line),
        }
    }
}

fn install_logging(config: &LogConfig) -> Result<(), ConfigError> {
    let filter = config.level_filter()?;
    let layer = ConsoleLayer::new(BrowserConsole).show_target(config.show_target);
    // A second instance on the same page keeps the first subscriber.
    if let Err(err) = tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
    {
        tracing::debug!(error = %err, "subscriber already installed");
    }
    Ok(())
}

// ============================================================================
// Observers and image probes
// ============================================================================

struct VisibilityObserver {
    observer: IntersectionObserver,
    _callback: Closure<dyn FnMut(Array)>,
}

impl VisibilityObserver {
    fn new(host: &Weak<Host>, kind: ObserverKind) -> Result<Self, WebHostError> {
        let weak = host.clone();
        let callback = Closure::<dyn FnMut(Array)>::new(move |entries: Array| {
            let Some(host) = weak.upgrade() else {
                return;
            };
            for entry in entries.iter() {
                let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                    continue;
                };
                host.deliver(PageEvent::Intersection {
                    target: entry.target(),
                    observer: kind,
                    intersecting: entry.is_intersecting(),
                });
            }
        });
        let init = IntersectionObserverInit::new();
        init.set_root_margin(kind.root_margin());
        init.set_threshold(&JsValue::from_f64(kind.threshold()));
        let observer =
            IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)
                .map_err(js_err)?;
        Ok(Self {
            observer,
            _callback: callback,
        })
    }
}

impl Drop for VisibilityObserver {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

struct TimelineObserver {
    observer: PerformanceObserver,
    _callback: Closure<dyn FnMut(PerformanceObserverEntryList)>,
}

impl TimelineObserver {
    const ENTRY_TYPES: [&'static str; 3] = ["layout-shift", "paint", "largest-contentful-paint"];

    fn new(host: &Weak<Host>) -> Result<Self, WebHostError> {
        let weak = host.clone();
        let callback = Closure::<dyn FnMut(PerformanceObserverEntryList)>::new(
            move |list: PerformanceObserverEntryList| {
                let Some(host) = weak.upgrade() else {
                    return;
                };
                for entry in list.get_entries().iter() {
                    if let Some(entry) = perf_entry(&entry) {
                        host.deliver(PageEvent::Performance(entry));
                    }
                }
            },
        );
        let observer =
            PerformanceObserver::new(callback.as_ref().unchecked_ref()).map_err(js_err)?;
        let observe: Function = Reflect::get(&observer, &JsValue::from_str("observe"))
            .and_then(|value| value.dyn_into::<Function>())
            .map_err(js_err)?;
        for entry_type in Self::ENTRY_TYPES {
            let init = Object::new();
            let _ = Reflect::set(&init, &"type".into(), &entry_type.into());
            let _ = Reflect::set(&init, &"buffered".into(), &JsValue::TRUE);
            if let Err(err) = observe.call1(&observer, &init) {
                tracing::debug!(entry_type, error = %describe(&err), "entry type not observed");
            }
        }
        Ok(Self {
            observer,
            _callback: callback,
        })
    }
}

impl Drop for TimelineObserver {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

/// An off-document image fetching a deferred source.
struct Probe {
    image: HtmlImageElement,
    target: Element,
    src: String,
    _on_load: Closure<dyn FnMut()>,
    _on_error: Closure<dyn FnMut()>,
}

impl Drop for Probe {
    fn drop(&mut self) {
        self.image.set_onload(None);
        self.image.set_onerror(None);
    }
}

// ============================================================================
// WebDom
// ============================================================================

/// [`Dom`] over the live browser document.
pub(crate) struct WebDom {
    window: Window,
    document: Document,
    body: HtmlElement,
    host: Weak<Host>,
    lazy_images: Option<VisibilityObserver>,
    reveal: Option<VisibilityObserver>,
    timeline: Option<TimelineObserver>,
}

impl WebDom {
    fn new(window: Window, document: Document, host: Weak<Host>) -> Result<Self, WebHostError> {
        let body = document.body().ok_or(WebHostError::NoBody)?;
        Ok(Self {
            window,
            document,
            body,
            host,
            lazy_images: None,
            reveal: None,
            timeline: None,
        })
    }

    fn observer(&mut self, kind: ObserverKind) -> Option<&IntersectionObserver> {
        let slot = match kind {
            ObserverKind::LazyImage => &mut self.lazy_images,
            ObserverKind::Reveal => &mut self.reveal,
        };
        if slot.is_none() {
            match VisibilityObserver::new(&self.host, kind) {
                Ok(observer) => *slot = Some(observer),
                Err(err) => {
                    tracing::warn!(error = %err, "visibility observer unavailable");
                    return None;
                }
            }
        }
        slot.as_ref().map(|o| &o.observer)
    }

    fn report(result: Result<(), JsValue>, op: &'static str) {
        if let Err(err) = result {
            tracing::debug!(op, error = %describe(&err), "DOM call failed");
        }
    }
}

impl Dom for WebDom {
    type Node = Element;

    fn query_all(&self, selector: &str) -> Vec<Element> {
        match self.document.query_selector_all(selector) {
            Ok(list) => elements(&list),
            Err(err) => {
                tracing::debug!(selector, error = %describe(&err), "bad selector");
                Vec::new()
            }
        }
    }

    fn query(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn query_within(&self, root: &Element, selector: &str) -> Vec<Element> {
        root.query_selector_all(selector)
            .map(|list| elements(&list))
            .unwrap_or_default()
    }

    fn matches(&self, node: &Element, selector: &str) -> bool {
        node.matches(selector).unwrap_or(false)
    }

    fn closest(&self, node: &Element, selector: &str) -> Option<Element> {
        node.closest(selector).ok().flatten()
    }

    fn contains(&self, ancestor: &Element, node: &Element) -> bool {
        let node: &Node = node;
        ancestor.contains(Some(node))
    }

    fn next_element_sibling(&self, node: &Element) -> Option<Element> {
        node.next_element_sibling()
    }

    fn body(&self) -> Element {
        self.body.clone().into()
    }

    fn create_element(&mut self, tag: &str) -> Option<Element> {
        self.document.create_element(tag).ok()
    }

    fn append_child(&mut self, parent: &Element, child: &Element) {
        Self::report(parent.append_child(child).map(drop), "appendChild");
    }

    fn prepend_child(&mut self, parent: &Element, child: &Element) {
        Self::report(parent.prepend_with_node_1(child), "prepend");
    }

    fn insert_after(&mut self, anchor: &Element, node: &Element) {
        Self::report(anchor.after_with_node_1(node), "after");
    }

    fn remove(&mut self, node: &Element) {
        node.remove();
    }

    fn set_text(&mut self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn text(&self, node: &Element) -> String {
        node.text_content().unwrap_or_default()
    }

    fn attr(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attr(&mut self, node: &Element, name: &str, value: &str) {
        Self::report(node.set_attribute(name, value), "setAttribute");
    }

    fn remove_attr(&mut self, node: &Element, name: &str) {
        Self::report(node.remove_attribute(name), "removeAttribute");
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn add_class(&mut self, node: &Element, class: &str) {
        Self::report(node.class_list().add_1(class), "classList.add");
    }

    fn remove_class(&mut self, node: &Element, class: &str) {
        Self::report(node.class_list().remove_1(class), "classList.remove");
    }

    fn value(&self, node: &Element) -> String {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.value()
        } else if let Some(area) = node.dyn_ref::<HtmlTextAreaElement>() {
            area.value()
        } else if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
            select.value()
        } else {
            node.get_attribute("value").unwrap_or_default()
        }
    }

    fn set_disabled(&mut self, node: &Element, disabled: bool) {
        let result = if disabled {
            node.set_attribute("disabled", "")
        } else {
            node.remove_attribute("disabled")
        };
        Self::report(result, "disabled");
    }

    fn reset_form(&mut self, form: &Element) {
        if let Some(form) = form.dyn_ref::<HtmlFormElement>() {
            form.reset();
        }
    }

    fn focus(&mut self, node: &Element) {
        let Some(element) = node.dyn_ref::<HtmlElement>() else {
            return;
        };
        let options = FocusOptions::new();
        options.set_prevent_scroll(true);
        Self::report(element.focus_with_options(&options), "focus");
    }

    fn active_element(&self) -> Option<Element> {
        self.document.active_element()
    }

    fn rect(&self, node: &Element) -> Rect {
        let r = node.get_bounding_client_rect();
        Rect::new(r.x(), r.y(), r.width(), r.height())
    }

    fn viewport(&self) -> Viewport {
        let dimension = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        Viewport::new(
            dimension(self.window.inner_width()),
            dimension(self.window.inner_height()),
        )
    }

    fn scroll_y(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn scroll_to(&mut self, y: f64) {
        let x = self.window.scroll_x().unwrap_or(0.0);
        self.window.scroll_to_with_x_and_y(x, y);
    }

    fn set_scroll_locked(&mut self, locked: bool) {
        let style = self.body.style();
        let result = if locked {
            style.set_property("overflow", "hidden")
        } else {
            style.remove_property("overflow").map(drop)
        };
        Self::report(result, "overflow");
    }

    fn location_path(&self) -> String {
        self.window.location().pathname().unwrap_or_default()
    }

    fn hostname(&self) -> String {
        self.window.location().hostname().unwrap_or_default()
    }

    fn observe(&mut self, node: &Element, kind: ObserverKind) {
        if let Some(observer) = self.observer(kind) {
            observer.observe(node);
        }
    }

    fn unobserve(&mut self, node: &Element, kind: ObserverKind) {
        if let Some(observer) = self.observer(kind) {
            observer.unobserve(node);
        }
    }

    fn load_image(&mut self, node: &Element, src: &str) {
        let Some(host) = self.host.upgrade() else {
            return;
        };
        if let Err(err) = start_probe(&host, node, src) {
            tracing::debug!(src, error = %err, "image probe failed");
            host.deliver(PageEvent::ImageSettled {
                target: node.clone(),
                result: Err(ImageLoadError { src: src.into() }),
            });
        }
    }

    fn observe_performance(&mut self) {
        if self.timeline.is_some() {
            return;
        }
        match TimelineObserver::new(&self.host) {
            Ok(observer) => self.timeline = Some(observer),
            Err(err) => tracing::debug!(error = %err, "performance observer unavailable"),
        }
    }

    fn resource_entries(&self) -> Vec<ResourceEntry> {
        let Some(performance) = self.window.performance() else {
            return Vec::new();
        };
        performance
            .get_entries_by_type("resource")
            .iter()
            .filter_map(|entry| entry.dyn_into::<PerformanceResourceTiming>().ok())
            .map(|timing| ResourceEntry {
                name: timing.name(),
                transfer_size: timing.transfer_size() as u64,
            })
            .collect()
    }
}

// ============================================================================
// Host
// ============================================================================

type Handler = fn(&Rc<Host>, &Event);

struct Listener {
    target: EventTarget,
    kind: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

/// Shared browser-side state behind a [`SiteKit`] instance.
struct Host {
    window: Window,
    document: Document,
    origin: web_time::Instant,
    clock: RefCell<DeterministicClock>,
    app: RefCell<Option<App<WebDom>>>,
    pending: RefCell<Option<SiteConfig>>,
    backlog: RefCell<VecDeque<PageEvent<Element>>>,
    probes: RefCell<HashMap<u32, Probe>>,
    retired: RefCell<Vec<Probe>>,
    next_probe: Cell<u32>,
    timeout: Cell<Option<(i32, Duration)>>,
    frame: Cell<Option<i32>>,
    on_timeout: Closure<dyn FnMut()>,
    on_frame: Closure<dyn FnMut(f64)>,
    listeners: RefCell<Vec<Listener>>,
}

impl Host {
    fn new(window: Window, document: Document, config: SiteConfig) -> Rc<Self> {
        Rc::new_cyclic(|weak: &Weak<Self>| {
            let on_timeout = {
                let weak = weak.clone();
                Closure::<dyn FnMut()>::new(move || {
                    if let Some(host) = weak.upgrade() {
                        host.timeout.set(None);
                        host.wake();
                    }
                })
            };
            let on_frame = {
                let weak = weak.clone();
                Closure::<dyn FnMut(f64)>::new(move |_timestamp: f64| {
                    if let Some(host) = weak.upgrade() {
                        host.frame.set(None);
                        host.wake();
                    }
                })
            };
            Self {
                window,
                document,
                origin: web_time::Instant::now(),
                clock: RefCell::new(DeterministicClock::new()),
                app: RefCell::new(None),
                pending: RefCell::new(Some(config)),
                backlog: RefCell::new(VecDeque::new()),
                probes: RefCell::new(HashMap::new()),
                retired: RefCell::new(Vec::new()),
                next_probe: Cell::new(0),
                timeout: Cell::new(None),
                frame: Cell::new(None),
                on_timeout,
                on_frame,
                listeners: RefCell::new(Vec::new()),
            }
        })
    }

    fn now(&self) -> Duration {
        let mut clock = self.clock.borrow_mut();
        clock.set(self.origin.elapsed());
        clock.now()
    }

    /// Run `f` against the app, then drain queued events and re-arm wake-ups.
    fn with_app<R>(&self, f: impl FnOnce(&mut App<WebDom>, Duration) -> R) -> Option<R> {
        let now = self.now();
        let result = {
            let mut slot = self.app.try_borrow_mut().ok()?;
            let app = slot.as_mut()?;
            let result = f(app, now);
            loop {
                let next = self.backlog.borrow_mut().pop_front();
                let Some(event) = next else {
                    break;
                };
                app.dispatch(&event, now);
            }
            result
        };
        self.schedule_wakeups();
        Some(result)
    }

    fn deliver(&self, event: PageEvent<Element>) -> Handled {
        if self.app.try_borrow_mut().is_err() {
            tracing::trace!("re-entrant event queued");
            self.backlog.borrow_mut().push_back(event);
            return Handled::No;
        }
        self.with_app(|app, now| app.dispatch(&event, now))
            .unwrap_or_default()
    }

    fn wake(&self) {
        self.retired.borrow_mut().clear();
        self.with_app(|app, now| app.tick(now));
    }

    fn schedule_wakeups(&self) {
        let (deadline, wants_frame) = {
            let Ok(slot) = self.app.try_borrow() else {
                return;
            };
            let Some(app) = slot.as_ref() else {
                return;
            };
            (app.next_deadline(), app.wants_animation_frame())
        };

        if wants_frame && self.frame.get().is_none() {
            match self
                .window
                .request_animation_frame(self.on_frame.as_ref().unchecked_ref())
            {
                Ok(handle) => self.frame.set(Some(handle)),
                Err(err) => tracing::warn!(error = %describe(&err), "requestAnimationFrame failed"),
            }
        }

        let current = self.timeout.get();
        if current.map(|(_, at)| at) == deadline {
            return;
        }
        if let Some((handle, _)) = current {
            self.window.clear_timeout_with_handle(handle);
            self.timeout.set(None);
        }
        let Some(at) = deadline else {
            return;
        };
        let delay = at.saturating_sub(self.now());
        let ms = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                self.on_timeout.as_ref().unchecked_ref(),
                ms,
            ) {
            Ok(handle) => self.timeout.set(Some((handle, at))),
            Err(err) => tracing::warn!(error = %describe(&err), "setTimeout failed"),
        }
    }

    fn settle_probe(&self, id: u32, loaded: bool) {
        let Some(probe) = self.probes.borrow_mut().remove(&id) else {
            return;
        };
        let event = PageEvent::ImageSettled {
            target: probe.target.clone(),
            result: if loaded {
                Ok(probe.src.clone())
            } else {
                Err(ImageLoadError {
                    src: probe.src.clone(),
                })
            },
        };
        // Still on the probe's own callback stack: park it until the next wake-up.
        self.retired.borrow_mut().push(probe);
        self.deliver(event);
    }

    fn report(&self, error: PageError) -> Handled {
        match self.with_app(|app, _| app.report_error(&error)) {
            Some(handled) => handled,
            None => {
                tracing::error!(error = %error, "page error");
                Handled::No
            }
        }
    }

    fn shutdown(&self) {
        for listener in self.listeners.borrow_mut().drain(..) {
            let _ = listener.target.remove_event_listener_with_callback(
                listener.kind,
                listener.callback.as_ref().unchecked_ref(),
            );
        }
        if let Some((handle, _)) = self.timeout.take() {
            self.window.clear_timeout_with_handle(handle);
        }
        if let Some(handle) = self.frame.take() {
            let _ = self.window.cancel_animation_frame(handle);
        }
        self.pending.borrow_mut().take();
        self.backlog.borrow_mut().clear();
        self.probes.borrow_mut().clear();
        self.retired.borrow_mut().clear();
        let app = self.app.try_borrow_mut().ok().and_then(|mut slot| slot.take());
        drop(app);
    }
}

/// Start fetching `src` for `target`; the outcome arrives as
/// [`PageEvent::ImageSettled`].
fn start_probe(host: &Rc<Host>, target: &Element, src: &str) -> Result<(), WebHostError> {
    let image = HtmlImageElement::new().map_err(js_err)?;
    let id = host.next_probe.get();
    host.next_probe.set(id.wrapping_add(1));

    let callback = |loaded: bool| {
        let weak = Rc::downgrade(host);
        Closure::<dyn FnMut()>::new(move || {
            if let Some(host) = weak.upgrade() {
                host.settle_probe(id, loaded);
            }
        })
    };
    let on_load = callback(true);
    let on_error = callback(false);
    image.set_onload(Some(on_load.as_ref().unchecked_ref()));
    image.set_onerror(Some(on_error.as_ref().unchecked_ref()));
    image.set_src(src);

    host.probes.borrow_mut().insert(
        id,
        Probe {
            image,
            target: target.clone(),
            src: src.to_owned(),
            _on_load: on_load,
            _on_error: on_error,
        },
    );
    Ok(())
}

fn listen(
    host: &Rc<Host>,
    target: &EventTarget,
    kind: &'static str,
    passive: bool,
    handler: Handler,
) -> Result<(), WebHostError> {
    let weak = Rc::downgrade(host);
    let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        if let Some(host) = weak.upgrade() {
            handler(&host, &event);
        }
    });
    let options = AddEventListenerOptions::new();
    options.set_passive(passive);
    target
        .add_event_listener_with_callback_and_add_event_listener_options(
            kind,
            callback.as_ref().unchecked_ref(),
            &options,
        )
        .map_err(js_err)?;
    host.listeners.borrow_mut().push(Listener {
        target: target.clone(),
        kind,
        callback,
    });
    Ok(())
}

fn finish(event: &Event, handled: Handled) {
    if handled.prevents_default() {
        event.prevent_default();
    }
}

fn on_click(host: &Rc<Host>, event: &Event) {
    if let Some(target) = event_element(event) {
        finish(event, host.deliver(PageEvent::Click { target }));
    }
}

fn on_keydown(host: &Rc<Host>, event: &Event) {
    let (Some(keyboard), Some(target)) = (event.dyn_ref::<KeyboardEvent>(), event_element(event))
    else {
        return;
    };
    let mut mods = Modifiers::empty();
    mods.set(Modifiers::SHIFT, keyboard.shift_key());
    mods.set(Modifiers::ALT, keyboard.alt_key());
    mods.set(Modifiers::CTRL, keyboard.ctrl_key());
    mods.set(Modifiers::SUPER, keyboard.meta_key());
    let key = normalize_dom_key(&keyboard.key(), mods);
    finish(event, host.deliver(PageEvent::KeyDown { target, key }));
}

fn on_submit(host: &Rc<Host>, event: &Event) {
    if let Some(form) = event_element(event) {
        finish(event, host.deliver(PageEvent::Submit { form }));
    }
}

fn on_focusout(host: &Rc<Host>, event: &Event) {
    if let Some(target) = event_element(event) {
        host.deliver(PageEvent::Blur { target });
    }
}

fn on_input(host: &Rc<Host>, event: &Event) {
    if let Some(target) = event_element(event) {
        host.deliver(PageEvent::Input { target });
    }
}

fn on_scroll(host: &Rc<Host>, _event: &Event) {
    host.deliver(PageEvent::Scroll);
}

fn on_resize(host: &Rc<Host>, _event: &Event) {
    host.deliver(PageEvent::Resize);
}

fn on_load(host: &Rc<Host>, _event: &Event) {
    host.deliver(PageEvent::Loaded);
}

fn on_error(host: &Rc<Host>, event: &Event) {
    let Some(error) = event.dyn_ref::<ErrorEvent>() else {
        return;
    };
    let source = error.filename();
    let line = error.lineno();
    finish(
        event,
        host.report(PageError::Uncaught {
            message: error.message(),
            source: (!source.is_empty()).then_some(source),
            line: (line > 0).then_some(line),
        }),
    );
}

fn on_rejection(host: &Rc<Host>, event: &Event) {
    let Some(rejection) = event.dyn_ref::<PromiseRejectionEvent>() else {
        return;
    };
    let reason = describe(&rejection.reason());
    finish(event, host.report(PageError::UnhandledRejection { reason }));
}

fn on_ready(host: &Rc<Host>, _event: &Event) {
    if let Err(err) = boot(host) {
        tracing::error!(error = %err, "sitekit failed to start");
    }
}

fn boot(host: &Rc<Host>) -> Result<(), WebHostError> {
    let Some(config) = host.pending.borrow_mut().take() else {
        return Ok(());
    };
    let caps = detect_capabilities(&host.window);
    let dom = WebDom::new(
        host.window.clone(),
        host.document.clone(),
        Rc::downgrade(host),
    )?;
    let app = App::boot(
        dom,
        caps,
        config,
        Box::new(SimulatedTransport::new()),
        host.now(),
    );
    *host.app.borrow_mut() = Some(app);

    let document: &EventTarget = &host.document;
    let window: &EventTarget = &host.window;
    let bindings: [(&EventTarget, &'static str, bool, Handler); 10] = [
        (document, "click", false, on_click),
        (document, "keydown", false, on_keydown),
        (document, "submit", false, on_submit),
        (document, "focusout", false, on_focusout),
        (document, "input", false, on_input),
        (window, "scroll", true, on_scroll),
        (window, "resize", true, on_resize),
        (window, "load", false, on_load),
        (window, "error", false, on_error),
        (window, "unhandledrejection", false, on_rejection),
    ];
    for (target, kind, passive, handler) in bindings {
        listen(host, target, kind, passive, handler)?;
    }

    if host.document.ready_state() == "complete" {
        host.deliver(PageEvent::Loaded);
    } else {
        host.with_app(|_, _| ());
    }
    Ok(())
}

// ============================================================================
// JS API
// ============================================================================

/// Page behavior layer.
///
/// `new SiteKit(options?)` boots on `DOMContentLoaded`, or immediately if
/// the document has already been parsed. `options` uses the `SiteConfig`
/// JSON shape; omitted keys keep their defaults.
#[wasm_bindgen]
pub struct SiteKit {
    host: Rc<Host>,
}

#[wasm_bindgen]
impl SiteKit {
    #[wasm_bindgen(constructor)]
    pub fn new(options: Option<JsValue>) -> Result<SiteKit, JsError> {
        let config = match options.filter(|o| !o.is_undefined() && !o.is_null()) {
            Some(options) => {
                let json = js_sys::JSON::stringify(&options).map_err(js_err)?;
                SiteConfig::from_json(&String::from(json))?
            }
            None => SiteConfig::default(),
        };
        install_logging(&config.logging)?;

        let window = web_sys::window().ok_or(WebHostError::NoDocument)?;
        let document = window.document().ok_or(WebHostError::NoDocument)?;
        let loading = document.ready_state() == "loading";
        let host = Host::new(window, document, config);
        if loading {
            let document: &EventTarget = &host.document;
            listen(&host, document, "DOMContentLoaded", false, on_ready)?;
        } else {
            boot(&host)?;
        }
        Ok(Self { host })
    }

    /// Whether the controllers are running.
    #[wasm_bindgen(js_name = isReady)]
    pub fn is_ready(&self) -> bool {
        self.host
            .app
            .try_borrow()
            .map(|slot| slot.is_some())
            .unwrap_or(true)
    }

    /// Speak `message` through the screen-reader live region.
    pub fn announce(&self, message: &str) {
        self.host.with_app(|app, _| app.announce(message));
    }

    /// Remove every listener, cancel pending callbacks, and drop the
    /// controllers. The page keeps whatever state it was left in.
    pub fn destroy(&mut self) {
        self.host.shutdown();
        tracing::debug!("sitekit destroyed");
    }
}
