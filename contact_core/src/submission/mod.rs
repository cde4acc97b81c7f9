//! Delivery of a validated draft to the site owner

pub mod direct;
pub mod relay;

pub use direct::{DirectChannelAdapter, EmailJsClient, TemplateMailer, TemplateRequest};
pub use relay::BackendRelayAdapter;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::config::{ChannelKind, ContactConfig};
use crate::form::Draft;

pub const GENERIC_FAILURE_MESSAGE: &str = "Message failed to send. Try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The channel is missing operator-side setup; nothing was sent.
    Configuration,
    /// The send was attempted and rejected or lost.
    Delivery,
}

/// Result of exactly one submit attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Success { message: String },
    Failure { message: String, kind: FailureKind },
}

impl SubmissionOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        SubmissionOutcome::Success { message: message.into() }
    }

    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        SubmissionOutcome::Failure {
            message: message.into(),
            kind,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            SubmissionOutcome::Success { message } => message,
            SubmissionOutcome::Failure { message, .. } => message,
        }
    }
}

#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("Email service is not configured.")]
    Configuration,

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl SubmissionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            SubmissionError::Configuration => FailureKind::Configuration,
            SubmissionError::Delivery(_) | SubmissionError::Transport(_) => FailureKind::Delivery,
        }
    }
}

/// Transmits a validated draft. Every failure resolves to
/// [`SubmissionOutcome::Failure`]; implementations never return an error.
#[async_trait]
pub trait SubmissionAdapter: Send + Sync {
    async fn submit(&self, draft: &Draft) -> SubmissionOutcome;

    fn name(&self) -> &'static str;
}

/// Builds the adapter selected by `contact.channel`.
pub fn build_adapter(config: &ContactConfig) -> Result<Arc<dyn SubmissionAdapter>, SubmissionError> {
    let adapter: Arc<dyn SubmissionAdapter> = match config.channel {
        ChannelKind::Direct => {
            let mailer = EmailJsClient::new(&config.direct.api_url, config.direct.timeout_seconds)?;
            Arc::new(DirectChannelAdapter::new(
                config.direct.clone(),
                Arc::new(mailer),
                config.owner_email.clone(),
            ))
        }
        ChannelKind::Relay => Arc::new(BackendRelayAdapter::new(
            &config.relay.base_url,
            config.relay.timeout_seconds,
        )?),
    };

    Ok(adapter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_accessors() {
        let outcome = SubmissionOutcome::success("ok");
        assert!(outcome.is_success());
        assert_eq!(outcome.message(), "ok");

        let outcome = SubmissionOutcome::failure(FailureKind::Delivery, "nope");
        assert!(!outcome.is_success());
        assert_eq!(outcome.message(), "nope");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(SubmissionError::Configuration.kind(), FailureKind::Configuration);
        assert_eq!(SubmissionError::Delivery("500".into()).kind(), FailureKind::Delivery);
        assert_eq!(SubmissionError::Configuration.to_string(), "Email service is not configured.");
    }

    #[test]
    fn test_build_adapter_follows_channel() {
        let mut config = ContactConfig::default();

        config.channel = ChannelKind::Relay;
        assert_eq!(build_adapter(&config).unwrap().name(), "relay");

        config.channel = ChannelKind::Direct;
        assert_eq!(build_adapter(&config).unwrap().name(), "direct");
    }
}
