#![forbid(unsafe_code)]

//! Tracing layer that writes one line per event to a console sink.
//!
//! In the browser the sink is the devtools console, with each level routed
//! to the matching `console.*` method so devtools filtering works. Tests use
//! an in-memory sink.
//!
//! ```
//! use sitekit_web::logging::{ConsoleLayer, MemorySink};
//! use tracing_subscriber::prelude::*;
//!
//! let sink = MemorySink::default();
//! let subscriber = tracing_subscriber::registry().with(ConsoleLayer::new(sink.clone()));
//! tracing::subscriber::with_default(subscriber, || tracing::info!(lcp_ms = 900.0, "LCP"));
//! assert_eq!(sink.lines()[0].1, "LCP lcp_ms=900");
//! ```

use std::fmt::{self, Write as _};
use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// Destination for formatted log lines.
pub trait ConsoleSink: Send + Sync + 'static {
    fn write(&self, level: Level, line: &str);
}

/// Sink that keeps every line, for tests and headless hosts.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<(Level, String)>>>,
}

impl MemorySink {
    /// Lines written so far.
    #[must_use]
    pub fn lines(&self) -> Vec<(Level, String)> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ConsoleSink for MemorySink {
    fn write(&self, level: Level, line: &str) {
        let mut lines = match self.lines.lock() {
            Ok(lines) => lines,
            Err(poisoned) => poisoned.into_inner(),
        };
        lines.push((level, line.to_owned()));
    }
}

#[derive(Default)]
struct LineVisitor {
    message: Option<String>,
    fields: Vec<(&'static str, String)>,
}

impl LineVisitor {
    fn push(&mut self, field: &Field, rendered: String) {
        if field.name() == "message" {
            self.message = Some(rendered);
        } else {
            self.fields.push((field.name(), rendered));
        }
    }
}

impl Visit for LineVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.push(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, value.to_owned());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.push(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, value.to_string());
    }
}

/// A `tracing_subscriber::Layer` that formats events as `message k=v ...`
/// and hands them to a [`ConsoleSink`].
pub struct ConsoleLayer<S> {
    sink: S,
    show_target: bool,
}

impl<S: ConsoleSink> ConsoleLayer<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            show_target: false,
        }
    }

    /// Builder: prefix lines with the event's target module.
    #[must_use]
    pub fn show_target(mut self, show: bool) -> Self {
        self.show_target = show;
        self
    }

    fn format(&self, event: &Event<'_>) -> String {
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        let mut line = String::new();
        if self.show_target {
            let _ = write!(line, "{}: ", event.metadata().target());
        }
        line.push_str(visitor.message.as_deref().unwrap_or_default());
        for (name, value) in &visitor.fields {
            let _ = write!(line, " {name}={value}");
        }
        line
    }
}

impl<S, Sub> Layer<Sub> for ConsoleLayer<S>
where
    S: ConsoleSink,
    Sub: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, Sub>) {
        let line = self.format(event);
        self.sink.write(*event.metadata().level(), &line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::prelude::*;

    fn capture(layer: ConsoleLayer<MemorySink>, filter: LevelFilter, f: impl FnOnce()) {
        let subscriber = tracing_subscriber::registry().with(layer.with_filter(filter));
        tracing::subscriber::with_default(subscriber, f);
    }

    #[test]
    fn fields_follow_the_message() {
        let sink = MemorySink::default();
        capture(ConsoleLayer::new(sink.clone()), LevelFilter::TRACE, || {
            tracing::warn!(resource = %"hero.png", bytes = 300_000u64, "large resource");
        });
        assert_eq!(
            sink.lines(),
            vec![(Level::WARN, "large resource resource=hero.png bytes=300000".to_owned())]
        );
    }

    #[test]
    fn target_prefix_is_optional() {
        let sink = MemorySink::default();
        capture(
            ConsoleLayer::new(sink.clone()).show_target(true),
            LevelFilter::TRACE,
            || tracing::error!(target: "sitekit", "boom"),
        );
        assert_eq!(sink.lines()[0].1, "sitekit: boom");
    }

    #[test]
    fn filter_drops_verbose_events() {
        let sink = MemorySink::default();
        capture(ConsoleLayer::new(sink.clone()), LevelFilter::INFO, || {
            tracing::debug!("menu opened");
            tracing::info!(cls = 0.1, "CLS");
        });
        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0], (Level::INFO, "CLS cls=0.1".to_owned()));
    }
}
