#![forbid(unsafe_code)]

//! Canonical page events pushed by the host.
//!
//! The host (browser glue or a test harness) translates DOM events, observer
//! callbacks, and asynchronous completions into [`PageEvent`] values. Key
//! input is normalized from DOM `key` strings so controllers never compare
//! raw strings.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Modifier keys held during a key event.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const ALT   = 0b0010;
        const CTRL  = 0b0100;
        const SUPER = 0b1000;
    }
}

/// Normalized key code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Escape,
    Tab,
    BackTab,
    Home,
    End,
    Up,
    Down,
    Left,
    Right,
    Unidentified(Box<str>),
}

impl KeyCode {
    /// Whether this key activates a button-like control (Enter or Space).
    #[must_use]
    pub fn is_activation(&self) -> bool {
        matches!(self, Self::Enter | Self::Char(' '))
    }
}

/// A keydown with its modifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInput {
    pub code: KeyCode,
    pub mods: Modifiers,
}

impl KeyInput {
    /// Key without modifiers.
    #[must_use]
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            mods: Modifiers::empty(),
        }
    }

    /// Attach modifiers, folding Shift+Tab into [`KeyCode::BackTab`].
    #[must_use]
    pub fn with_mods(mut self, mods: Modifiers) -> Self {
        self.mods = mods;
        if self.code == KeyCode::Tab && mods.contains(Modifiers::SHIFT) {
            self.code = KeyCode::BackTab;
        }
        self
    }
}

/// Map a DOM `KeyboardEvent.key` value to a [`KeyCode`].
#[must_use]
pub fn normalize_dom_key(key: &str, mods: Modifiers) -> KeyInput {
    let code = match key {
        "Enter" => KeyCode::Enter,
        "Escape" | "Esc" => KeyCode::Escape,
        "Tab" => KeyCode::Tab,
        "Home" => KeyCode::Home,
        "End" => KeyCode::End,
        "ArrowUp" | "Up" => KeyCode::Up,
        "ArrowDown" | "Down" => KeyCode::Down,
        "ArrowLeft" | "Left" => KeyCode::Left,
        "ArrowRight" | "Right" => KeyCode::Right,
        "Spacebar" => KeyCode::Char(' '),
        _ => {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c),
                _ => KeyCode::Unidentified(key.into()),
            }
        }
    };
    KeyInput::new(code).with_mods(mods)
}

/// Which visibility observer a node is registered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObserverKind {
    /// Deferred image loading.
    LazyImage,
    /// One-shot entrance animation.
    Reveal,
}

impl ObserverKind {
    /// `rootMargin` the host observer should use.
    #[must_use]
    pub const fn root_margin(self) -> &'static str {
        match self {
            Self::LazyImage => "50px 0px",
            Self::Reveal => "0px 0px -50px 0px",
        }
    }

    /// Intersection ratio that counts as visible.
    #[must_use]
    pub const fn threshold(self) -> f64 {
        match self {
            Self::LazyImage => 0.01,
            Self::Reveal => 0.1,
        }
    }
}

/// A performance timeline entry forwarded by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum PerfEntry {
    /// `layout-shift` entry.
    LayoutShift { value: f64, had_recent_input: bool },
    /// `paint` entry (`first-paint`, `first-contentful-paint`).
    Paint { name: String, start_time_ms: f64 },
    /// `largest-contentful-paint` entry.
    LargestContentfulPaint { render_time_ms: f64 },
}

/// A completed resource load from the resource timing buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    pub name: String,
    pub transfer_size: u64,
}

/// Failure to fetch a deferred image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageLoadError {
    pub src: String,
}

impl fmt::Display for ImageLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to load image {}", self.src)
    }
}

impl std::error::Error for ImageLoadError {}

/// Failure reported by a submission transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// The receiving end refused the submission.
    Rejected(String),
    /// No answer within the transport's time bound.
    TimedOut,
    /// The transport itself failed.
    Transport(String),
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected(reason) => write!(f, "submission rejected: {reason}"),
            Self::TimedOut => write!(f, "submission timed out"),
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
        }
    }
}

impl std::error::Error for SubmitError {}

/// A script failure caught at page level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    /// `window.onerror`.
    Uncaught {
        message: String,
        source: Option<String>,
        line: Option<u32>,
    },
    /// `unhandledrejection`.
    UnhandledRejection { reason: String },
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uncaught {
                message,
                source: Some(source),
                line: Some(line),
            } => write!(f, "{message} ({source}:{line})"),
            Self::Uncaught { message, .. } => write!(f, "{message}"),
            Self::UnhandledRejection { reason } => write!(f, "unhandled rejection: {reason}"),
        }
    }
}

impl std::error::Error for PageError {}

/// Canonical page event, generic over the host's node handle.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent<N> {
    /// Primary activation (click or tap) on `target`.
    Click { target: N },
    /// Key pressed while `target` had focus.
    KeyDown { target: N, key: KeyInput },
    /// Page scroll offset changed.
    Scroll,
    /// Viewport size changed.
    Resize,
    /// A form is about to submit.
    Submit { form: N },
    /// A field lost focus.
    Blur { target: N },
    /// A field's value changed.
    Input { target: N },
    /// Visibility change reported by an observer.
    Intersection {
        target: N,
        observer: ObserverKind,
        intersecting: bool,
    },
    /// A deferred image load finished. `Ok` carries the resolved source.
    ImageSettled {
        target: N,
        result: Result<String, ImageLoadError>,
    },
    /// A deferred submission finished.
    SubmissionSettled {
        form: N,
        outcome: Result<(), SubmitError>,
    },
    /// Performance timeline entry.
    Performance(PerfEntry),
    /// The page and its subresources finished loading (`window` `load`).
    Loaded,
}

/// What the host should do with the DOM event after dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Handled {
    /// Nobody acted on the event.
    #[default]
    No,
    /// A controller acted; default browser behavior stands.
    Yes,
    /// A controller acted and the host must call `preventDefault`.
    PreventDefault,
}

impl Handled {
    /// Combine two results, keeping the strongest.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        match (self, other) {
            (Self::PreventDefault, _) | (_, Self::PreventDefault) => Self::PreventDefault,
            (Self::Yes, _) | (_, Self::Yes) => Self::Yes,
            _ => Self::No,
        }
    }

    /// Whether the host must suppress the default action.
    #[must_use]
    pub const fn prevents_default(self) -> bool {
        matches!(self, Self::PreventDefault)
    }
}
