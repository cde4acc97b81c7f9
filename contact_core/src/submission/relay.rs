//! Backend relay channel: one JSON POST to the site's own `/api/contact`

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info, warn};

use super::{FailureKind, SubmissionAdapter, SubmissionError, SubmissionOutcome, GENERIC_FAILURE_MESSAGE};
use crate::form::Draft;

pub const CONTACT_PATH: &str = "/api/contact";

#[derive(Debug, Deserialize)]
struct RelayResponse {
    success: bool,
    message: Option<String>,
    detail: Option<String>,
}

#[derive(Clone)]
pub struct BackendRelayAdapter {
    client: Client,
    endpoint: String,
}

impl BackendRelayAdapter {
    pub fn new(base_url: &str, timeout_seconds: u64) -> Result<Self, SubmissionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), CONTACT_PATH),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(&self, draft: &Draft) -> Result<RelayResponse, SubmissionError> {
        let response = self.client.post(&self.endpoint).json(draft).send().await?;
        let status = response.status();

        match response.json::<RelayResponse>().await {
            Ok(body) => Ok(body),
            Err(e) => Err(SubmissionError::Delivery(format!(
                "unreadable response ({}): {}",
                status.as_u16(),
                e
            ))),
        }
    }
}

#[async_trait]
impl SubmissionAdapter for BackendRelayAdapter {
    async fn submit(&self, draft: &Draft) -> SubmissionOutcome {
        match self.post(draft).await {
            Ok(RelayResponse { success: true, message, .. }) => {
                info!(endpoint = %self.endpoint, "Contact message relayed");
                SubmissionOutcome::success(message.unwrap_or_else(|| "Message sent.".to_string()))
            }
            Ok(RelayResponse { detail, .. }) => {
                warn!(endpoint = %self.endpoint, detail = ?detail, "Backend rejected contact message");
                SubmissionOutcome::failure(
                    FailureKind::Delivery,
                    detail
                        .filter(|d| !d.trim().is_empty())
                        .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string()),
                )
            }
            Err(e) => {
                error!(endpoint = %self.endpoint, error = %e, "Contact relay request failed");
                SubmissionOutcome::failure(FailureKind::Delivery, GENERIC_FAILURE_MESSAGE)
            }
        }
    }

    fn name(&self) -> &'static str {
        "relay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base_url() {
        let adapter = BackendRelayAdapter::new("http://localhost:8001/", 5).unwrap();
        assert_eq!(adapter.endpoint(), "http://localhost:8001/api/contact");

        let adapter = BackendRelayAdapter::new("http://localhost:8001", 5).unwrap();
        assert_eq!(adapter.endpoint(), "http://localhost:8001/api/contact");
    }

    #[tokio::test]
    async fn test_unreachable_backend_yields_generic_failure() {
        // port 9 (discard) is not listening on loopback in test environments
        let adapter = BackendRelayAdapter::new("http://127.0.0.1:9", 2).unwrap();

        let outcome = adapter.submit(&Draft::new("A", "a@b.com", "", "Hello there")).await;

        assert_eq!(
            outcome,
            SubmissionOutcome::failure(FailureKind::Delivery, GENERIC_FAILURE_MESSAGE)
        );
    }
}
