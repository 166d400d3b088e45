#![forbid(unsafe_code)]

//! Client-side form validation and submission.
//!
//! Every form matching [`FormConfig::selector`] is taken over at
//! construction: native submission is always suppressed, fields are
//! validated on blur (and re-validated on input while invalid), and a valid
//! submit is handed to the [`SubmitTransport`].
//!
//! # Field errors
//!
//! An invalid field gets the error class, `aria-invalid="true"`, and a
//! `span.error-message[role=alert]` right after it, referenced from the
//! field's `aria-describedby`. Every validation pass clears the previous
//! display first.
//!
//! # Submission
//!
//! ```text
//! Idle --submit(valid)--> Submitting --settled--> Idle
//!   ^                         |
//!   +--submit(invalid)        +--submit: ignored
//! ```
//!
//! Settlement restores the submit control exactly once, shows a status
//! banner at the top of the form (replacing any earlier one), and removes it
//! after [`FormConfig::banner_ms`].

mod transport;

pub use transport::{Dispatch, SimulatedTransport, SubmitTransport, Submission};

use std::fmt;

use serde::Deserialize;
use sitekit_core::dom::Dom;
use sitekit_core::event::{Handled, PageEvent, SubmitError};
use sitekit_core::timer::TimerId;

use crate::context::{Context, Timer};
use crate::validation::{FieldKind, FieldRules, ValidationError};
use crate::{Controller, ControllerKey, millis};

/// Input types that never carry user data.
const SKIPPED_TYPES: [&str; 5] = ["submit", "button", "hidden", "reset", "image"];

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    pub selector: String,
    pub fields: String,
    pub submit: String,
    pub error_class: String,
    pub message_class: String,
    pub loading_class: String,
    pub busy_label: String,
    pub success_class: String,
    pub success_message: String,
    pub failure_class: String,
    pub failure_message: String,
    pub banner_ms: u64,
    pub scroll_offset: f64,
    pub scroll_duration_ms: u64,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            selector: "form[novalidate]".into(),
            fields: "input, textarea, select".into(),
            submit: "button, input[type=submit]".into(),
            error_class: "error".into(),
            message_class: "error-message".into(),
            loading_class: "loading".into(),
            busy_label: "Sending...".into(),
            success_class: "form-success".into(),
            success_message: "Thank you! Your message has been sent successfully.".into(),
            failure_class: "form-error".into(),
            failure_message: "Sorry, there was an error sending your message. Please try again."
                .into(),
            banner_ms: 5_000,
            scroll_offset: 100.0,
            scroll_duration_ms: 800,
        }
    }
}

/// Submission phase of one form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitPhase {
    #[default]
    Idle,
    Submitting,
}

#[derive(Debug)]
struct Field<N> {
    node: N,
    /// `name`, falling back to `id`.
    key: String,
    rules: FieldRules,
    error: Option<ValidationError>,
    message: Option<N>,
    /// `aria-describedby` as authored, restored when the error clears.
    described_by: Option<String>,
}

#[derive(Debug)]
struct Control<N> {
    node: N,
    is_input: bool,
    label: Option<String>,
}

#[derive(Debug)]
struct Binding<N> {
    form: N,
    fields: Vec<Field<N>>,
    submit: Option<Control<N>>,
    phase: SubmitPhase,
    banner: Option<(N, TimerId)>,
}

/// Validates and submits every opted-in form on the page.
pub struct Forms<N> {
    config: FormConfig,
    forms: Vec<Binding<N>>,
    transport: Box<dyn SubmitTransport>,
}

impl<N: fmt::Debug> fmt::Debug for Forms<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Forms")
            .field("config", &self.config)
            .field("forms", &self.forms)
            .finish_non_exhaustive()
    }
}

impl<N: Clone + PartialEq + fmt::Debug> Forms<N> {
    /// Bind every matching form, or `None` if the page has none.
    pub fn new<D: Dom<Node = N>>(
        dom: &mut D,
        config: FormConfig,
        transport: Box<dyn SubmitTransport>,
    ) -> Option<Self> {
        let forms: Vec<_> = dom
            .query_all(&config.selector)
            .into_iter()
            .map(|form| bind_form(dom, &config, form))
            .collect();
        if forms.is_empty() {
            return None;
        }
        tracing::debug!(forms = forms.len(), "forms bound");
        Some(Self {
            config,
            forms,
            transport,
        })
    }

    #[must_use]
    pub fn phase(&self, form: &N) -> Option<SubmitPhase> {
        self.binding(form).map(|b| b.phase)
    }

    /// Current error of `field`, if it is bound and invalid.
    #[must_use]
    pub fn field_error(&self, field: &N) -> Option<&ValidationError> {
        self.forms
            .iter()
            .flat_map(|b| &b.fields)
            .find(|f| &f.node == field)
            .and_then(|f| f.error.as_ref())
    }

    /// Status banner currently shown in `form`.
    #[must_use]
    pub fn banner(&self, form: &N) -> Option<&N> {
        self.binding(form)
            .and_then(|b| b.banner.as_ref())
            .map(|(node, _)| node)
    }

    fn binding(&self, form: &N) -> Option<&Binding<N>> {
        self.forms.iter().find(|b| &b.form == form)
    }

    fn binding_index(&self, form: &N) -> Option<usize> {
        self.forms.iter().position(|b| &b.form == form)
    }

    fn locate_field(&self, node: &N) -> Option<(usize, usize)> {
        self.forms.iter().enumerate().find_map(|(bi, b)| {
            b.fields
                .iter()
                .position(|f| &f.node == node)
                .map(|fi| (bi, fi))
        })
    }

    /// Validate one field and refresh its error display. Returns validity.
    fn validate_field<D: Dom<Node = N>>(&mut self, dom: &mut D, bi: usize, fi: usize) -> bool {
        let config = &self.config;
        let field = &mut self.forms[bi].fields[fi];
        clear_error(dom, config, field);
        let result = field.rules.validate(&dom.value(&field.node));
        match result.error() {
            None => true,
            Some(error) => {
                show_error(dom, config, field, error.clone());
                false
            }
        }
    }

    fn on_submit<D: Dom<Node = N>>(&mut self, dom: &mut D, bi: usize, cx: &mut Context<'_, N>) {
        if self.forms[bi].phase == SubmitPhase::Submitting {
            tracing::debug!("submit ignored while a submission is in flight");
            return;
        }

        let mut first_invalid = None;
        for fi in 0..self.forms[bi].fields.len() {
            if !self.validate_field(dom, bi, fi) && first_invalid.is_none() {
                first_invalid = Some(fi);
            }
        }
        if let Some(fi) = first_invalid {
            let node = self.forms[bi].fields[fi].node.clone();
            dom.focus(&node);
            cx.scroll_to_element(
                dom,
                &node,
                self.config.scroll_offset,
                millis(self.config.scroll_duration_ms),
            );
            return;
        }

        let binding = &mut self.forms[bi];
        let submission = Submission {
            form_id: dom.attr(&binding.form, "id"),
            action: dom.attr(&binding.form, "action"),
            fields: binding
                .fields
                .iter()
                .map(|f| (f.key.clone(), dom.value(&f.node)))
                .collect(),
        };
        binding.phase = SubmitPhase::Submitting;
        dom.set_attr(&binding.form, "aria-busy", "true");
        if let Some(control) = binding.submit.as_mut() {
            control.label = Some(read_label(dom, control));
            dom.set_disabled(&control.node, true);
            dom.add_class(&control.node, &self.config.loading_class);
            write_label(dom, control, &self.config.busy_label);
        }

        let form = binding.form.clone();
        match self.transport.dispatch(&submission) {
            Dispatch::After { delay, outcome } => {
                cx.schedule(delay, Timer::SubmissionSettled { form, outcome });
            }
            Dispatch::Deferred => {}
        }
        tracing::debug!(fields = submission.fields.len(), "form submitted");
    }

    fn settle<D: Dom<Node = N>>(
        &mut self,
        dom: &mut D,
        form: &N,
        outcome: &Result<(), SubmitError>,
        cx: &mut Context<'_, N>,
    ) {
        let Some(bi) = self.binding_index(form) else {
            return;
        };
        let config = &self.config;
        let binding = &mut self.forms[bi];
        if binding.phase != SubmitPhase::Submitting {
            return;
        }
        binding.phase = SubmitPhase::Idle;
        dom.remove_attr(&binding.form, "aria-busy");
        if let Some(control) = binding.submit.as_mut() {
            if let Some(label) = control.label.take() {
                write_label(dom, control, &label);
            }
            dom.remove_class(&control.node, &config.loading_class);
            dom.set_disabled(&control.node, false);
        }

        let (class, role, message) = match outcome {
            Ok(()) => (&config.success_class, "status", &config.success_message),
            Err(error) => {
                tracing::warn!(error = %error, "form submission failed");
                (&config.failure_class, "alert", &config.failure_message)
            }
        };
        if let Some((old, timer)) = binding.banner.take() {
            cx.cancel(timer);
            dom.remove(&old);
        }
        if let Some(banner) = dom.create_element("div") {
            dom.add_class(&banner, class);
            dom.set_attr(&banner, "role", role);
            dom.set_text(&banner, message);
            dom.prepend_child(&binding.form, &banner);
            let timer = cx.schedule(
                millis(config.banner_ms),
                Timer::DismissBanner {
                    banner: banner.clone(),
                },
            );
            binding.banner = Some((banner, timer));
        }

        if outcome.is_ok() {
            dom.reset_form(&binding.form);
            for field in &mut binding.fields {
                clear_error(dom, config, field);
            }
        }
        cx.announce(dom, message);
    }

    fn dismiss_banner<D: Dom<Node = N>>(&mut self, dom: &mut D, banner: &N) {
        for binding in &mut self.forms {
            if binding.banner.as_ref().is_some_and(|(node, _)| node == banner) {
                binding.banner = None;
            }
        }
        dom.remove(banner);
    }
}

impl<D: Dom> Controller<D> for Forms<D::Node> {
    fn key(&self) -> ControllerKey {
        ControllerKey::Forms
    }

    fn handle(
        &mut self,
        dom: &mut D,
        event: &PageEvent<D::Node>,
        cx: &mut Context<'_, D::Node>,
    ) -> Handled {
        match event {
            PageEvent::Submit { form } => {
                let Some(bi) = self.binding_index(form) else {
                    return Handled::No;
                };
                self.on_submit(dom, bi, cx);
                Handled::PreventDefault
            }
            PageEvent::Blur { target } => match self.locate_field(target) {
                Some((bi, fi)) => {
                    self.validate_field(dom, bi, fi);
                    Handled::Yes
                }
                None => Handled::No,
            },
            PageEvent::Input { target } => match self.locate_field(target) {
                Some((bi, fi)) if self.forms[bi].fields[fi].error.is_some() => {
                    self.validate_field(dom, bi, fi);
                    Handled::Yes
                }
                _ => Handled::No,
            },
            PageEvent::SubmissionSettled { form, outcome } => {
                self.settle(dom, form, outcome, cx);
                Handled::Yes
            }
            _ => Handled::No,
        }
    }

    fn on_timer(&mut self, dom: &mut D, timer: Timer<D::Node>, cx: &mut Context<'_, D::Node>) {
        match timer {
            Timer::SubmissionSettled { form, outcome } => self.settle(dom, &form, &outcome, cx),
            Timer::DismissBanner { banner } => self.dismiss_banner(dom, &banner),
            _ => {}
        }
    }
}

fn bind_form<D: Dom>(dom: &D, config: &FormConfig, form: D::Node) -> Binding<D::Node> {
    let fields = dom
        .query_within(&form, &config.fields)
        .into_iter()
        .filter_map(|node| {
            let ty = dom.attr(&node, "type");
            if ty
                .as_deref()
                .is_some_and(|t| SKIPPED_TYPES.contains(&t.to_ascii_lowercase().as_str()))
            {
                return None;
            }
            let key = ["name", "id"]
                .into_iter()
                .filter_map(|attr| dom.attr(&node, attr))
                .find(|key| !key.is_empty())?;
            let rules = FieldRules::new(
                dom.attr(&node, "required").is_some(),
                FieldKind::from_type_attr(ty.as_deref()),
            );
            Some(Field {
                described_by: dom.attr(&node, "aria-describedby"),
                node,
                key,
                rules,
                error: None,
                message: None,
            })
        })
        .collect();

    let submit = dom
        .query_within(&form, &config.submit)
        .into_iter()
        .find(|node| {
            dom.attr(node, "type")
                .is_none_or(|t| t.eq_ignore_ascii_case("submit"))
        })
        .map(|node| Control {
            is_input: dom.matches(&node, "input"),
            node,
            label: None,
        });

    Binding {
        form,
        fields,
        submit,
        phase: SubmitPhase::Idle,
        banner: None,
    }
}

fn clear_error<D: Dom>(dom: &mut D, config: &FormConfig, field: &mut Field<D::Node>) {
    field.error = None;
    dom.remove_class(&field.node, &config.error_class);
    dom.set_attr(&field.node, "aria-invalid", "false");
    if let Some(message) = field.message.take() {
        dom.remove(&message);
    }
    match &field.described_by {
        Some(ids) => dom.set_attr(&field.node, "aria-describedby", ids),
        None => dom.remove_attr(&field.node, "aria-describedby"),
    }
}

fn show_error<D: Dom>(
    dom: &mut D,
    config: &FormConfig,
    field: &mut Field<D::Node>,
    error: ValidationError,
) {
    dom.add_class(&field.node, &config.error_class);
    dom.set_attr(&field.node, "aria-invalid", "true");
    if let Some(message) = dom.create_element("span") {
        let id = format!("{}-error", field.key);
        dom.add_class(&message, &config.message_class);
        dom.set_attr(&message, "id", &id);
        dom.set_attr(&message, "role", "alert");
        dom.set_text(&message, &error.message);
        dom.insert_after(&field.node, &message);
        let described_by = match &field.described_by {
            Some(ids) => format!("{ids} {id}"),
            None => id,
        };
        dom.set_attr(&field.node, "aria-describedby", &described_by);
        field.message = Some(message);
    }
    field.error = Some(error);
}

fn read_label<D: Dom>(dom: &D, control: &Control<D::Node>) -> String {
    if control.is_input {
        dom.attr(&control.node, "value").unwrap_or_default()
    } else {
        dom.text(&control.node)
    }
}

fn write_label<D: Dom>(dom: &mut D, control: &Control<D::Node>, label: &str) {
    if control.is_input {
        dom.set_attr(&control.node, "value", label);
    } else {
        dom.set_text(&control.node, label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Services;
    use crate::validation::{MESSAGE_EMAIL, MESSAGE_REQUIRED};
    use sitekit_core::capabilities::HostCapabilities;
    use sitekit_core::dom::memory::{MemoryDom, NodeId};
    use std::time::Duration;

    struct Page {
        dom: MemoryDom,
        form: NodeId,
        name: NodeId,
        email: NodeId,
        button: NodeId,
    }

    fn page() -> Page {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        let form = dom.add(body, "form", &[("novalidate", ""), ("id", "contact")]);
        let name = dom.add(form, "input", &[("name", "name"), ("required", "")]);
        let email = dom.add(
            form,
            "input",
            &[("type", "email"), ("id", "email"), ("required", "")],
        );
        dom.add(form, "input", &[("type", "hidden"), ("name", "token")]);
        dom.add(form, "input", &[("name", "")]);
        let button = dom.add(form, "button", &[("type", "submit")]);
        dom.set_text(&button, "Send");
        Page {
            dom,
            form,
            name,
            email,
            button,
        }
    }

    fn forms(dom: &mut MemoryDom) -> Forms<NodeId> {
        Forms::new(dom, FormConfig::default(), Box::new(SimulatedTransport::new()))
            .expect("form bound")
    }

    fn dispatch(
        forms: &mut Forms<NodeId>,
        dom: &mut MemoryDom,
        services: &mut Services<NodeId>,
        now: Duration,
        event: PageEvent<NodeId>,
    ) -> Handled {
        forms.handle(dom, &event, &mut services.context(now))
    }

    fn fire_timers(
        forms: &mut Forms<NodeId>,
        dom: &mut MemoryDom,
        services: &mut Services<NodeId>,
        now: Duration,
    ) {
        while let Some(timer) = services.pop_due(now) {
            forms.on_timer(dom, timer, &mut services.context(now));
        }
    }

    #[test]
    fn page_without_forms_binds_nothing() {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        dom.add(body, "form", &[]);
        let transport = Box::new(SimulatedTransport::new());
        assert!(Forms::new(&mut dom, FormConfig::default(), transport).is_none());
    }

    #[test]
    fn hidden_and_anonymous_fields_are_skipped() {
        let mut p = page();
        let forms = forms(&mut p.dom);
        let keys: Vec<_> = forms.forms[0].fields.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["name", "email"]);
    }

    #[test]
    fn blur_on_empty_required_field_shows_error() {
        let mut p = page();
        let mut forms = forms(&mut p.dom);
        let mut services = Services::new(HostCapabilities::modern());
        let handled = dispatch(
            &mut forms,
            &mut p.dom,
            &mut services,
            millis(0),
            PageEvent::Blur { target: p.name },
        );
        assert_eq!(handled, Handled::Yes);
        assert_eq!(
            forms.field_error(&p.name).map(|e| e.message.as_str()),
            Some(MESSAGE_REQUIRED)
        );
        assert!(p.dom.has_class(&p.name, "error"));
        assert_eq!(p.dom.attr(&p.name, "aria-invalid").as_deref(), Some("true"));

        let message = p.dom.next_element_sibling(&p.name).expect("message");
        assert!(p.dom.has_class(&message, "error-message"));
        assert_eq!(p.dom.attr(&message, "role").as_deref(), Some("alert"));
        assert_eq!(p.dom.text(&message), MESSAGE_REQUIRED);
        assert_eq!(
            p.dom.attr(&p.name, "aria-describedby"),
            p.dom.attr(&message, "id")
        );
    }

    #[test]
    fn revalidation_replaces_previous_message() {
        let mut p = page();
        let mut forms = forms(&mut p.dom);
        let mut services = Services::new(HostCapabilities::modern());
        let blur = PageEvent::Blur { target: p.email };
        dispatch(&mut forms, &mut p.dom, &mut services, millis(0), blur.clone());
        p.dom.set_value(p.email, "not-an-email");
        dispatch(&mut forms, &mut p.dom, &mut services, millis(1), blur);

        assert_eq!(
            forms.field_error(&p.email).map(|e| e.message.as_str()),
            Some(MESSAGE_EMAIL)
        );
        assert_eq!(p.dom.query_all(".error-message").len(), 1);
    }

    #[test]
    fn input_revalidates_only_invalid_fields() {
        let mut p = page();
        let mut forms = forms(&mut p.dom);
        let mut services = Services::new(HostCapabilities::modern());

        p.dom.set_value(p.email, "x");
        let input = PageEvent::Input { target: p.email };
        assert_eq!(
            dispatch(&mut forms, &mut p.dom, &mut services, millis(0), input.clone()),
            Handled::No
        );
        assert!(forms.field_error(&p.email).is_none());

        dispatch(
            &mut forms,
            &mut p.dom,
            &mut services,
            millis(1),
            PageEvent::Blur { target: p.email },
        );
        assert!(forms.field_error(&p.email).is_some());

        p.dom.set_value(p.email, "user@example.com");
        dispatch(&mut forms, &mut p.dom, &mut services, millis(2), input);
        assert!(forms.field_error(&p.email).is_none());
        assert!(!p.dom.has_class(&p.email, "error"));
        assert_eq!(p.dom.attr(&p.email, "aria-invalid").as_deref(), Some("false"));
        assert_eq!(p.dom.attr(&p.email, "aria-describedby"), None);
        assert!(p.dom.query_all(".error-message").is_empty());
    }

    #[test]
    fn invalid_submit_focuses_first_invalid_field() {
        let mut p = page();
        let mut forms = forms(&mut p.dom);
        let mut services = Services::new(HostCapabilities::modern());
        p.dom.set_value(p.name, "Ada");

        let handled = dispatch(
            &mut forms,
            &mut p.dom,
            &mut services,
            millis(0),
            PageEvent::Submit { form: p.form },
        );
        assert_eq!(handled, Handled::PreventDefault);
        assert_eq!(p.dom.active_element(), Some(p.email));
        assert_eq!(forms.phase(&p.form), Some(SubmitPhase::Idle));
        assert!(p.dom.attr(&p.button, "disabled").is_none());
        assert_eq!(services.pending_timers(), 0);
    }

    #[test]
    fn valid_submit_disables_then_restores_once() {
        let mut p = page();
        let mut forms = forms(&mut p.dom);
        let mut services = Services::new(HostCapabilities::modern());
        p.dom.set_value(p.name, "Ada");
        p.dom.set_value(p.email, "ada@example.com");

        let submit = PageEvent::Submit { form: p.form };
        dispatch(&mut forms, &mut p.dom, &mut services, millis(0), submit.clone());
        assert_eq!(forms.phase(&p.form), Some(SubmitPhase::Submitting));
        assert!(p.dom.attr(&p.button, "disabled").is_some());
        assert!(p.dom.has_class(&p.button, "loading"));
        assert_eq!(p.dom.text(&p.button), "Sending...");

        // Ignored while in flight.
        dispatch(&mut forms, &mut p.dom, &mut services, millis(100), submit);
        assert_eq!(services.pending_timers(), 1);

        fire_timers(&mut forms, &mut p.dom, &mut services, millis(1_499));
        assert_eq!(forms.phase(&p.form), Some(SubmitPhase::Submitting));

        fire_timers(&mut forms, &mut p.dom, &mut services, millis(1_500));
        assert_eq!(forms.phase(&p.form), Some(SubmitPhase::Idle));
        assert!(p.dom.attr(&p.button, "disabled").is_none());
        assert!(!p.dom.has_class(&p.button, "loading"));
        assert_eq!(p.dom.text(&p.button), "Send");

        let banner = *forms.banner(&p.form).expect("banner");
        assert!(p.dom.has_class(&banner, "form-success"));
        assert_eq!(p.dom.attr(&banner, "role").as_deref(), Some("status"));
        assert_eq!(p.dom.value(&p.name), "");

        // A stray late settlement changes nothing.
        dispatch(
            &mut forms,
            &mut p.dom,
            &mut services,
            millis(1_600),
            PageEvent::SubmissionSettled {
                form: p.form,
                outcome: Err(SubmitError::TimedOut),
            },
        );
        assert_eq!(forms.banner(&p.form), Some(&banner));

        fire_timers(&mut forms, &mut p.dom, &mut services, millis(6_500));
        assert!(forms.banner(&p.form).is_none());
        assert!(!p.dom.is_attached(banner));
    }

    #[test]
    fn deferred_failure_shows_alert_banner_and_keeps_values() {
        let mut p = page();
        let transport = Box::new(|_: &Submission| Dispatch::Deferred);
        let mut forms = Forms::new(&mut p.dom, FormConfig::default(), transport).expect("bound");
        let mut services = Services::new(HostCapabilities::modern());
        p.dom.set_value(p.name, "Ada");
        p.dom.set_value(p.email, "ada@example.com");

        dispatch(
            &mut forms,
            &mut p.dom,
            &mut services,
            millis(0),
            PageEvent::Submit { form: p.form },
        );
        assert_eq!(services.pending_timers(), 0);
        dispatch(
            &mut forms,
            &mut p.dom,
            &mut services,
            millis(900),
            PageEvent::SubmissionSettled {
                form: p.form,
                outcome: Err(SubmitError::Rejected("spam".into())),
            },
        );

        let banner = *forms.banner(&p.form).expect("banner");
        assert!(p.dom.has_class(&banner, "form-error"));
        assert_eq!(p.dom.attr(&banner, "role").as_deref(), Some("alert"));
        assert_eq!(
            p.dom.text(&banner),
            "Sorry, there was an error sending your message. Please try again."
        );
        assert_eq!(p.dom.value(&p.name), "Ada");
        assert!(p.dom.attr(&p.button, "disabled").is_none());
    }

    #[test]
    fn new_banner_replaces_old_one() {
        let mut p = page();
        let transport = Box::new(|_: &Submission| Dispatch::After {
            delay: Duration::ZERO,
            outcome: Ok(()),
        });
        let mut forms = Forms::new(&mut p.dom, FormConfig::default(), transport).expect("bound");
        let mut services = Services::new(HostCapabilities::modern());

        for now in [0, 1_000] {
            p.dom.set_value(p.name, "Ada");
            p.dom.set_value(p.email, "ada@example.com");
            dispatch(
                &mut forms,
                &mut p.dom,
                &mut services,
                millis(now),
                PageEvent::Submit { form: p.form },
            );
            fire_timers(&mut forms, &mut p.dom, &mut services, millis(now));
        }
        assert_eq!(p.dom.query_all(".form-success").len(), 1);
        // Only the second banner's dismissal is still pending.
        assert_eq!(services.next_deadline(), Some(millis(6_000)));
    }
}
