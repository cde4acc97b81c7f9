//! Direct channel: template emails sent straight to a transactional email API

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

use super::{SubmissionAdapter, SubmissionError, SubmissionOutcome};
use crate::config::DirectChannelConfig;
use crate::form::Draft;

pub const DIRECT_SUCCESS_MESSAGE: &str =
    "Thank you for reaching out. I'll get back to you within 24 hours.";

const SUBMISSION_ID_LEN: usize = 13;

/// One template send as the email API expects it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateRequest {
    pub service_id: String,
    pub template_id: String,
    #[serde(rename = "user_id")]
    pub public_key: String,
    pub template_params: Value,
}

#[async_trait]
pub trait TemplateMailer: Send + Sync {
    async fn send(&self, request: &TemplateRequest) -> Result<(), SubmissionError>;
}

/// REST client for an EmailJS-compatible `email/send` endpoint.
#[derive(Clone)]
pub struct EmailJsClient {
    client: Client,
    endpoint: String,
}

impl EmailJsClient {
    pub fn new(endpoint: &str, timeout_seconds: u64) -> Result<Self, SubmissionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl TemplateMailer for EmailJsClient {
    async fn send(&self, request: &TemplateRequest) -> Result<(), SubmissionError> {
        let response = self.client.post(&self.endpoint).json(request).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(SubmissionError::Delivery(format!("{} {}", status.as_u16(), body.trim())))
    }
}

struct ResolvedChannel<'a> {
    service_id: &'a str,
    notification_template: &'a str,
    autoreply_template: Option<&'a str>,
    public_key: &'a str,
}

pub struct DirectChannelAdapter {
    config: DirectChannelConfig,
    mailer: Arc<dyn TemplateMailer>,
    owner_email: Option<String>,
}

impl DirectChannelAdapter {
    pub fn new(
        config: DirectChannelConfig,
        mailer: Arc<dyn TemplateMailer>,
        owner_email: Option<String>,
    ) -> Self {
        Self {
            config,
            mailer,
            owner_email,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.resolve().is_ok()
    }

    fn resolve(&self) -> Result<ResolvedChannel<'_>, SubmissionError> {
        fn present(value: &Option<String>) -> Option<&str> {
            value.as_deref().map(str::trim).filter(|v| !v.is_empty())
        }

        match (
            present(&self.config.service_id),
            present(&self.config.notification_template),
            present(&self.config.public_key),
        ) {
            (Some(service_id), Some(notification_template), Some(public_key)) => Ok(ResolvedChannel {
                service_id,
                notification_template,
                autoreply_template: present(&self.config.autoreply_template),
                public_key,
            }),
            _ => Err(SubmissionError::Configuration),
        }
    }

    fn delivery_failure_message(&self) -> String {
        match self.owner_email.as_deref().filter(|email| !email.is_empty()) {
            Some(email) => format!("Please try again or email me directly at {}", email),
            None => "Please try again later.".to_string(),
        }
    }

    async fn deliver(&self, draft: &Draft) -> Result<(), SubmissionError> {
        let channel = self.resolve()?;

        let submission_id = generate_submission_id();
        let notification = TemplateRequest {
            service_id: channel.service_id.to_string(),
            template_id: channel.notification_template.to_string(),
            public_key: channel.public_key.to_string(),
            template_params: json!({
                "from_name": draft.name,
                "from_email": draft.email,
                "subject": draft.subject,
                "message": draft.message,
                "submission_time": Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
                "submission_id": submission_id,
            }),
        };

        self.mailer.send(&notification).await?;
        info!(submission_id = %submission_id, "Contact notification sent");

        if let Some(autoreply_template) = channel.autoreply_template {
            let autoreply = TemplateRequest {
                service_id: channel.service_id.to_string(),
                template_id: autoreply_template.to_string(),
                public_key: channel.public_key.to_string(),
                template_params: json!({
                    "from_name": draft.name,
                    "from_email": draft.email,
                    "message": draft.message,
                }),
            };

            self.mailer.send(&autoreply).await?;
            info!(submission_id = %submission_id, "Auto-reply sent");
        }

        Ok(())
    }
}

#[async_trait]
impl SubmissionAdapter for DirectChannelAdapter {
    async fn submit(&self, draft: &Draft) -> SubmissionOutcome {
        match self.deliver(draft).await {
            Ok(()) => SubmissionOutcome::success(DIRECT_SUCCESS_MESSAGE),
            Err(SubmissionError::Configuration) => {
                error!("Direct email channel is missing service id, template or public key");
                SubmissionOutcome::failure(
                    SubmissionError::Configuration.kind(),
                    SubmissionError::Configuration.to_string(),
                )
            }
            Err(e) => {
                error!(error = %e, "Direct email delivery failed");
                SubmissionOutcome::failure(e.kind(), self.delivery_failure_message())
            }
        }
    }

    fn name(&self) -> &'static str {
        "direct"
    }
}

/// Short alphanumeric token for correlating a notification with logs.
/// Not unique; collisions are harmless.
pub fn generate_submission_id() -> String {
    Uuid::new_v4().simple().to_string()[..SUBMISSION_ID_LEN].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submission::FailureKind;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<TemplateRequest>>,
        fail_template: Option<String>,
    }

    #[async_trait]
    impl TemplateMailer for RecordingMailer {
        async fn send(&self, request: &TemplateRequest) -> Result<(), SubmissionError> {
            self.sent.lock().push(request.clone());
            if self.fail_template.as_deref() == Some(request.template_id.as_str()) {
                return Err(SubmissionError::Delivery("400 rejected".to_string()));
            }
            Ok(())
        }
    }

    fn full_config() -> DirectChannelConfig {
        DirectChannelConfig {
            service_id: Some("service_1".to_string()),
            notification_template: Some("template_notify".to_string()),
            autoreply_template: Some("template_reply".to_string()),
            public_key: Some("pk_123".to_string()),
            ..DirectChannelConfig::default()
        }
    }

    fn draft() -> Draft {
        Draft::new("A", "a@b.com", "Hi", "Hello there, testing.")
    }

    #[tokio::test]
    async fn test_sends_notification_then_autoreply() {
        let mailer = Arc::new(RecordingMailer::default());
        let adapter = DirectChannelAdapter::new(full_config(), mailer.clone(), None);

        let outcome = adapter.submit(&draft()).await;

        assert_eq!(outcome, SubmissionOutcome::success(DIRECT_SUCCESS_MESSAGE));
        let sent = mailer.sent.lock();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].template_id, "template_notify");
        assert_eq!(sent[0].template_params["from_email"], "a@b.com");
        assert_eq!(sent[0].template_params["subject"], "Hi");
        assert_eq!(
            sent[0].template_params["submission_id"].as_str().unwrap().len(),
            SUBMISSION_ID_LEN
        );
        assert_eq!(sent[1].template_id, "template_reply");
        assert_eq!(sent[1].template_params["from_email"], "a@b.com");
        assert!(sent[1].template_params.get("submission_id").is_none());
    }

    #[tokio::test]
    async fn test_autoreply_is_optional() {
        let mailer = Arc::new(RecordingMailer::default());
        let mut config = full_config();
        config.autoreply_template = None;
        let adapter = DirectChannelAdapter::new(config, mailer.clone(), None);

        assert!(adapter.submit(&draft()).await.is_success());
        assert_eq!(mailer.sent.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_configuration_skips_network() {
        let mailer = Arc::new(RecordingMailer::default());
        let mut config = full_config();
        config.public_key = Some("  ".to_string());
        let adapter = DirectChannelAdapter::new(config, mailer.clone(), None);

        assert!(!adapter.is_configured());
        let outcome = adapter.submit(&draft()).await;

        assert_eq!(
            outcome,
            SubmissionOutcome::failure(FailureKind::Configuration, "Email service is not configured.")
        );
        assert!(mailer.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn test_failed_autoreply_fails_whole_attempt() {
        let mailer = Arc::new(RecordingMailer {
            fail_template: Some("template_reply".to_string()),
            ..RecordingMailer::default()
        });
        let adapter = DirectChannelAdapter::new(
            full_config(),
            mailer.clone(),
            Some("owner@example.com".to_string()),
        );

        let outcome = adapter.submit(&draft()).await;

        assert_eq!(
            outcome,
            SubmissionOutcome::failure(
                FailureKind::Delivery,
                "Please try again or email me directly at owner@example.com"
            )
        );
        assert_eq!(mailer.sent.lock().len(), 2);
    }

    #[test]
    fn test_submission_id_is_alphanumeric() {
        let id = generate_submission_id();
        assert_eq!(id.len(), SUBMISSION_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_template_request_wire_names() {
        let request = TemplateRequest {
            service_id: "s".to_string(),
            template_id: "t".to_string(),
            public_key: "k".to_string(),
            template_params: json!({}),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["user_id"], "k");
        assert!(json.get("public_key").is_none());
    }
}
