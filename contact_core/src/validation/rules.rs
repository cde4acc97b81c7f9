//! Validation rules for the individual contact form fields

use lazy_static::lazy_static;
use regex::Regex;

use super::FieldRule;
use crate::form::Field;

pub const MIN_MESSAGE_LENGTH: usize = 10;

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

/// Matches `local@domain.tld`: no whitespace, one `@`, a dot after it.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

pub struct NameRule;

impl FieldRule for NameRule {
    fn field(&self) -> Field {
        Field::Name
    }

    fn check(&self, value: &str) -> Option<String> {
        value
            .trim()
            .is_empty()
            .then(|| "Please enter your name.".to_string())
    }
}

pub struct EmailRule;

impl FieldRule for EmailRule {
    fn field(&self) -> Field {
        Field::Email
    }

    fn check(&self, value: &str) -> Option<String> {
        if value.trim().is_empty() {
            return Some("Please enter a valid email.".to_string());
        }

        // The pattern runs on the raw value, so padded input is rejected too.
        if !is_valid_email(value) {
            return Some("Please enter a valid email address.".to_string());
        }

        None
    }
}

pub struct SubjectRule;

impl FieldRule for SubjectRule {
    fn field(&self) -> Field {
        Field::Subject
    }

    fn check(&self, value: &str) -> Option<String> {
        value
            .trim()
            .is_empty()
            .then(|| "Please enter a subject.".to_string())
    }
}

pub struct MessageRule {
    min_length: Option<usize>,
}

impl MessageRule {
    pub fn new(min_length: Option<usize>) -> Self {
        Self { min_length }
    }
}

impl FieldRule for MessageRule {
    fn field(&self) -> Field {
        Field::Message
    }

    fn check(&self, value: &str) -> Option<String> {
        let trimmed = value.trim();

        match self.min_length {
            Some(min) if trimmed.chars().count() < min => {
                Some(format!("Message must be at least {} characters.", min))
            }
            None if trimmed.is_empty() => Some("Please enter your message.".to_string()),
            _ => None,
        }
    }
}
