#![forbid(unsafe_code)]

//! Where validated form data goes.
//!
//! The form controller never performs I/O itself. It hands a [`Submission`]
//! to a [`SubmitTransport`], which either knows the outcome up front and
//! asks for it to be delivered after a delay, or reports back later through
//! [`PageEvent::SubmissionSettled`](sitekit_core::event::PageEvent::SubmissionSettled).

use std::time::Duration;

use sitekit_core::event::SubmitError;

/// Validated name/value pairs of one form, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Submission {
    /// The form's `id`, if it has one.
    pub form_id: Option<String>,
    /// The form's `action` attribute.
    pub action: Option<String>,
    pub fields: Vec<(String, String)>,
}

impl Submission {
    /// First value submitted under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// How a transport will report its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Settle with `outcome` once `delay` has elapsed.
    After {
        delay: Duration,
        outcome: Result<(), SubmitError>,
    },
    /// The host will deliver the outcome as a page event.
    Deferred,
}

/// Sends submissions somewhere.
pub trait SubmitTransport {
    fn dispatch(&mut self, submission: &Submission) -> Dispatch;
}

impl<F: FnMut(&Submission) -> Dispatch> SubmitTransport for F {
    fn dispatch(&mut self, submission: &Submission) -> Dispatch {
        self(submission)
    }
}

/// Stand-in backend: every submission settles with a fixed outcome after a
/// fixed delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedTransport {
    delay: Duration,
    outcome: Result<(), SubmitError>,
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedTransport {
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(1_500);

    /// Succeeds after [`Self::DEFAULT_DELAY`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            delay: Self::DEFAULT_DELAY,
            outcome: Ok(()),
        }
    }

    /// Fails with `error` after [`Self::DEFAULT_DELAY`].
    #[must_use]
    pub const fn failing(error: SubmitError) -> Self {
        Self {
            delay: Self::DEFAULT_DELAY,
            outcome: Err(error),
        }
    }

    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl SubmitTransport for SimulatedTransport {
    fn dispatch(&mut self, submission: &Submission) -> Dispatch {
        tracing::debug!(
            form = submission.form_id.as_deref().unwrap_or("<anonymous>"),
            fields = submission.fields.len(),
            "simulated submission"
        );
        Dispatch::After {
            delay: self.delay,
            outcome: self.outcome.clone(),
        }
    }
}
