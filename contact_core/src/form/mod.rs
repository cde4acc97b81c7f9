//! Contact form draft and the state holder that owns it

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::validation::ValidationResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Email,
    Subject,
    Message,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Name, Field::Email, Field::Subject, Field::Message];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Subject => "subject",
            Field::Message => "message",
        }
    }

    pub fn parse(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|field| field.as_str() == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The user's in-progress, unsubmitted message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub subject: String,
    pub message: String,
}

impl Draft {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            subject: subject.into(),
            message: message.into(),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Subject => &self.subject,
            Field::Message => &self.message,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Name => self.name = value,
            Field::Email => self.email = value,
            Field::Subject => self.subject = value,
            Field::Message => self.message = value,
        }
    }

    pub fn is_empty(&self) -> bool {
        Field::ALL.iter().all(|field| self.get(*field).is_empty())
    }

    /// Subject with surrounding whitespace removed, `None` when blank.
    pub fn subject_line(&self) -> Option<&str> {
        let subject = self.subject.trim();
        (!subject.is_empty()).then_some(subject)
    }
}

/// Draft values plus the inline error shown under each field.
#[derive(Debug, Clone, Default)]
pub struct FormState {
    draft: Draft,
    errors: BTreeMap<Field, String>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn errors(&self) -> &BTreeMap<Field, String> {
        &self.errors
    }

    pub fn error(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    /// Applies one input event. An error already shown for the edited field is
    /// dropped right away, without re-running validation.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        self.draft.set(field, value);
        self.errors.remove(&field);
    }

    pub fn apply_validation(&mut self, result: &ValidationResult) {
        self.errors = result.errors().clone();
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    pub fn reset(&mut self) {
        self.draft = Draft::default();
        self.errors.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_round_trips_through_name() {
        for field in Field::ALL {
            assert_eq!(Field::parse(field.as_str()), Some(field));
        }
        assert_eq!(Field::parse("phone"), None);
    }

    #[test]
    fn test_editing_clears_only_that_fields_error() {
        let mut state = FormState::new();
        let mut result = ValidationResult::success();
        result.add_error(Field::Name, "Please enter your name.");
        result.add_error(Field::Email, "Please enter a valid email.");
        state.apply_validation(&result);

        state.set_field(Field::Name, "A");

        assert_eq!(state.error(Field::Name), None);
        assert_eq!(state.error(Field::Email), Some("Please enter a valid email."));
        assert_eq!(state.draft().name, "A");
    }

    #[test]
    fn test_reset_empties_draft_and_errors() {
        let mut state = FormState::new();
        state.set_field(Field::Message, "Hello");
        let mut result = ValidationResult::success();
        result.add_error(Field::Subject, "Please enter a subject.");
        state.apply_validation(&result);

        state.reset();

        assert!(state.draft().is_empty());
        assert!(state.errors().is_empty());
    }

    #[test]
    fn test_subject_line_ignores_whitespace() {
        let draft = Draft::new("A", "a@b.com", "   ", "Hello there");
        assert_eq!(draft.subject_line(), None);

        let draft = Draft::new("A", "a@b.com", " Hi ", "Hello there");
        assert_eq!(draft.subject_line(), Some("Hi"));
    }

    #[test]
    fn test_draft_deserializes_without_subject() {
        let draft: Draft = serde_json::from_str(
            r#"{"name":"A","email":"a@b.com","message":"Hello there"}"#,
        ).unwrap();
        assert_eq!(draft.subject, "");
    }
}
