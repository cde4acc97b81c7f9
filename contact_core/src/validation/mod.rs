//! Draft validation built from per-field rules chosen by a validation profile

pub mod rules;

pub use rules::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::form::{Draft, Field};

/// Field to message mapping; a missing key means the field passed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationResult {
    errors: BTreeMap<Field, String>,
}

impl ValidationResult {
    pub fn success() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &BTreeMap<Field, String> {
        &self.errors
    }

    pub fn error(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn add_error(&mut self, field: Field, message: impl Into<String>) {
        self.errors.insert(field, message.into());
    }

    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
    }

    /// First message in field order, used where only one line can be shown.
    pub fn first_error(&self) -> Option<&str> {
        self.errors.values().next().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Which of the observed form variants a validator enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationProfile {
    pub subject_required: bool,
    pub message_min_length: Option<usize>,
}

impl ValidationProfile {
    /// Subject required, no minimum message length.
    pub fn strict_subject() -> Self {
        Self {
            subject_required: true,
            message_min_length: None,
        }
    }

    /// Subject optional, message at least ten characters.
    pub fn min_message() -> Self {
        Self {
            subject_required: false,
            message_min_length: Some(MIN_MESSAGE_LENGTH),
        }
    }
}

impl Default for ValidationProfile {
    fn default() -> Self {
        Self::strict_subject()
    }
}

/// A single check against one draft field.
pub trait FieldRule: Send + Sync {
    fn field(&self) -> Field;

    fn check(&self, value: &str) -> Option<String>;
}

pub struct Validator {
    rules: Vec<Box<dyn FieldRule>>,
}

impl Validator {
    pub fn new(rules: Vec<Box<dyn FieldRule>>) -> Self {
        Self { rules }
    }

    pub fn from_profile(profile: ValidationProfile) -> Self {
        let mut rules: Vec<Box<dyn FieldRule>> = vec![Box::new(NameRule), Box::new(EmailRule)];

        if profile.subject_required {
            rules.push(Box::new(SubjectRule));
        }

        rules.push(Box::new(MessageRule::new(profile.message_min_length)));

        Self::new(rules)
    }

    /// Runs every rule; no rule short-circuits another.
    pub fn validate(&self, draft: &Draft) -> ValidationResult {
        let mut result = ValidationResult::success();

        for rule in &self.rules {
            let field = rule.field();
            if result.error(field).is_some() {
                continue;
            }
            if let Some(message) = rule.check(draft.get(field)) {
                result.add_error(field, message);
            }
        }

        result
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::from_profile(ValidationProfile::default())
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<Field> = self.rules.iter().map(|rule| rule.field()).collect();
        f.debug_struct("Validator").field("rules", &fields).finish()
    }
}
