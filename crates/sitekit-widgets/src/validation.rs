#![forbid(unsafe_code)]

//! Field validation rules.
//!
//! Validators are pure functions of the field value. Which validators apply
//! to a field is derived from its markup (`required`, `type`) by
//! [`FieldRules`]; rules run in priority order and the first failure wins.
//!
//! Optional-format validators ([`Email`], [`Phone`]) accept the empty
//! string: emptiness is [`Required`]'s concern.

use std::fmt;

/// Error code for required field validation.
pub const ERROR_CODE_REQUIRED: &str = "required";
/// Error code for email validation.
pub const ERROR_CODE_EMAIL: &str = "email";
/// Error code for phone number validation.
pub const ERROR_CODE_PHONE: &str = "phone";

pub const MESSAGE_REQUIRED: &str = "This field is required.";
pub const MESSAGE_EMAIL: &str = "Please enter a valid email address.";
pub const MESSAGE_PHONE: &str = "Please enter a valid phone number.";

/// Longest digit run accepted after the leading `[1-9]`.
const PHONE_MAX_TRAILING_DIGITS: usize = 15;

/// A validation failure with a stable code and a user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

/// The result of a validation operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ValidationResult {
    #[default]
    Valid,
    Invalid(ValidationError),
}

impl ValidationResult {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    #[must_use]
    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            Self::Valid => None,
            Self::Invalid(e) => Some(e),
        }
    }

    /// Keep the first error; otherwise evaluate `next`.
    #[must_use]
    pub fn and_then(self, next: impl FnOnce() -> Self) -> Self {
        match self {
            Self::Valid => next(),
            Self::Invalid(_) => self,
        }
    }

    fn invalid(code: &'static str, message: &str) -> Self {
        Self::Invalid(ValidationError::new(code, message))
    }
}

/// A check over values of type `T`.
pub trait Validator<T: ?Sized> {
    fn validate(&self, value: &T) -> ValidationResult;

    /// Message reported on failure.
    fn error_message(&self) -> &str;
}

/// Rejects empty and whitespace-only values.
#[derive(Debug, Clone, Copy, Default)]
pub struct Required;

impl Validator<str> for Required {
    fn validate(&self, value: &str) -> ValidationResult {
        if value.trim().is_empty() {
            ValidationResult::invalid(ERROR_CODE_REQUIRED, self.error_message())
        } else {
            ValidationResult::Valid
        }
    }

    fn error_message(&self) -> &str {
        MESSAGE_REQUIRED
    }
}

/// `local@domain.tld`: no whitespace, exactly one `@`, and a `.` inside the
/// domain with text on both sides.
#[derive(Debug, Clone, Copy, Default)]
pub struct Email;

impl Email {
    fn is_well_formed(value: &str) -> bool {
        if value.chars().any(char::is_whitespace) {
            return false;
        }
        let Some((local, domain)) = value.split_once('@') else {
            return false;
        };
        if local.is_empty() || domain.contains('@') {
            return false;
        }
        let last = domain.len().saturating_sub(1);
        domain
            .char_indices()
            .any(|(i, c)| c == '.' && i > 0 && i < last)
    }
}

impl Validator<str> for Email {
    fn validate(&self, value: &str) -> ValidationResult {
        let value = value.trim();
        if value.is_empty() || Self::is_well_formed(value) {
            ValidationResult::Valid
        } else {
            ValidationResult::invalid(ERROR_CODE_EMAIL, self.error_message())
        }
    }

    fn error_message(&self) -> &str {
        MESSAGE_EMAIL
    }
}

/// International-style phone number.
///
/// Spaces, dashes and parentheses are ignored; what remains must be an
/// optional `+`, a non-zero digit, and at most 15 further digits.
#[derive(Debug, Clone, Copy, Default)]
pub struct Phone;

impl Phone {
    fn is_well_formed(value: &str) -> bool {
        let compact: String = value
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
            .collect();
        let digits = compact.strip_prefix('+').unwrap_or(&compact);
        let mut chars = digits.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        if !matches!(first, '1'..='9') {
            return false;
        }
        let rest = chars.as_str();
        rest.len() <= PHONE_MAX_TRAILING_DIGITS && rest.chars().all(|c| c.is_ascii_digit())
    }
}

impl Validator<str> for Phone {
    fn validate(&self, value: &str) -> ValidationResult {
        let value = value.trim();
        if value.is_empty() || Self::is_well_formed(value) {
            ValidationResult::Valid
        } else {
            ValidationResult::invalid(ERROR_CODE_PHONE, self.error_message())
        }
    }

    fn error_message(&self) -> &str {
        MESSAGE_PHONE
    }
}

/// Value format implied by an input's `type` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldKind {
    #[default]
    Text,
    Email,
    Tel,
}

impl FieldKind {
    #[must_use]
    pub fn from_type_attr(ty: Option<&str>) -> Self {
        match ty.map(str::to_ascii_lowercase).as_deref() {
            Some("email") => Self::Email,
            Some("tel") => Self::Tel,
            _ => Self::Text,
        }
    }
}

/// The rules that apply to one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldRules {
    pub required: bool,
    pub kind: FieldKind,
}

impl FieldRules {
    #[must_use]
    pub const fn new(required: bool, kind: FieldKind) -> Self {
        Self { required, kind }
    }

    /// Run the rules in priority order; the first failure wins.
    #[must_use]
    pub fn validate(&self, value: &str) -> ValidationResult {
        let presence = if self.required {
            Required.validate(value)
        } else {
            ValidationResult::Valid
        };
        presence.and_then(|| match self.kind {
            FieldKind::Text => ValidationResult::Valid,
            FieldKind::Email => Email.validate(value),
            FieldKind::Tel => Phone.validate(value),
        })
    }
}
