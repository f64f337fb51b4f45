//! Field rules for request bodies.
//!
//! Request models deserialize every field as optional so that all rule violations can be
//! collected and reported together instead of failing on the first missing field.

use lettre::Address;
use url::Url;

use crate::errors::{Error, FieldError};

/// Collects rule violations for one request body.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Require a non-blank value and return it trimmed.
    pub fn required<'a>(&mut self, field: &str, value: Option<&'a str>) -> Option<&'a str> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Some(v),
            _ => {
                self.push(field, format!("\"{field}\" is required"));
                None
            }
        }
    }

    /// Require a value whose length in characters lies within `min..=max`.
    pub fn length<'a>(&mut self, field: &str, value: Option<&'a str>, min: usize, max: usize) -> Option<&'a str> {
        let value = self.required(field, value)?;
        let len = value.chars().count();
        if len < min {
            self.push(field, format!("\"{field}\" must be at least {min} characters long"));
            None
        } else if len > max {
            self.push(field, format!("\"{field}\" must be at most {max} characters long"));
            None
        } else {
            Some(value)
        }
    }

    /// Require a deliverable-looking email address.
    pub fn email<'a>(&mut self, field: &str, value: Option<&'a str>) -> Option<&'a str> {
        let value = self.required(field, value)?;
        if is_valid_email(value) {
            Some(value)
        } else {
            self.push(field, format!("\"{field}\" must be a valid email"));
            None
        }
    }

    /// Require an absolute URI.
    pub fn absolute_uri<'a>(&mut self, field: &str, value: Option<&'a str>) -> Option<&'a str> {
        let value = self.required(field, value)?;
        if Url::parse(value).is_ok() {
            Some(value)
        } else {
            self.push(field, format!("\"{field}\" must be a valid uri"));
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Ok(())` when no rule failed, otherwise a validation error carrying every failure.
    pub fn finish(self) -> Result<(), Error> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation { errors: self.errors })
        }
    }
}

/// Syntactically valid address with a dotted domain (`user@localhost` is rejected).
pub fn is_valid_email(value: &str) -> bool {
    match value.parse::<Address>() {
        Ok(address) => {
            let domain = address.domain();
            domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        Err(_) => false,
    }
}
