use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::form::{Draft, Field};
use crate::validation::ValidationResult;

/// Body of `POST /api/contact`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ContactRequest {
    #[validate(length(max = 100, message = "Name must not exceed 100 characters."))]
    pub name: String,

    #[validate(length(max = 254, message = "Email must not exceed 254 characters."))]
    pub email: String,

    #[validate(length(max = 200, message = "Subject must not exceed 200 characters."))]
    #[serde(default)]
    pub subject: Option<String>,

    #[validate(length(max = 5000, message = "Message must not exceed 5000 characters."))]
    pub message: String,
}

impl ContactRequest {
    /// Length caps from the derive, reported in the same shape as draft errors.
    pub fn check_limits(&self) -> ValidationResult {
        match self.validate() {
            Ok(()) => ValidationResult::success(),
            Err(errors) => limits_to_result(&errors),
        }
    }

    pub fn to_draft(&self) -> Draft {
        Draft::new(
            self.name.clone(),
            self.email.clone(),
            self.subject.clone().unwrap_or_default(),
            self.message.clone(),
        )
    }
}

impl From<Draft> for ContactRequest {
    fn from(draft: Draft) -> Self {
        let subject = draft.subject_line().map(str::to_string);
        Self {
            name: draft.name,
            email: draft.email,
            subject,
            message: draft.message,
        }
    }
}

fn limits_to_result(errors: &ValidationErrors) -> ValidationResult {
    let mut result = ValidationResult::success();

    for (field, field_errors) in errors.field_errors() {
        let Some(field) = Field::parse(&field) else {
            continue;
        };
        if let Some(message) = field_errors.iter().find_map(|e| e.message.as_ref()) {
            result.add_error(field, message.to_string());
        }
    }

    result
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
}

impl ContactResponse {
    pub fn accepted(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
