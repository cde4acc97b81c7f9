use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    error::{AppError, Result},
    mail::{autoreply_mail, notification_mail, Mailer},
    metrics::MetricsCollector,
    models::{ContactRequest, ContactResponse},
    store::{ContactSubmission, SubmissionStatus, SubmissionStore},
    validation::Validator,
};

pub const ACCEPTED_MESSAGE: &str = "Thanks — I'll respond within 48 hours.";

/// Server side of the relay channel: validate, store, notify the owner and
/// send the submitter an auto-reply.
#[derive(Clone)]
pub struct ContactService {
    store: SubmissionStore,
    mailer: Arc<dyn Mailer>,
    validator: Arc<Validator>,
    metrics: MetricsCollector,
    recipient: String,
    owner_name: String,
}

impl ContactService {
    pub fn new(
        store: SubmissionStore,
        mailer: Arc<dyn Mailer>,
        validator: Validator,
        metrics: MetricsCollector,
        recipient: impl Into<String>,
        owner_name: impl Into<String>,
    ) -> Self {
        Self {
            store,
            mailer,
            validator: Arc::new(validator),
            metrics,
            recipient: recipient.into(),
            owner_name: owner_name.into(),
        }
    }

    pub fn store(&self) -> &SubmissionStore {
        &self.store
    }

    pub fn mailer_kind(&self) -> &'static str {
        self.mailer.kind()
    }

    pub async fn submit(&self, request: ContactRequest) -> Result<ContactResponse> {
        let mut result = request.check_limits();
        result.merge(self.validator.validate(&request.to_draft()));

        if !result.is_valid() {
            self.metrics.record_submission_rejected();
            info!(errors = result.len(), "Rejected contact submission");
            return Err(AppError::Validation(result));
        }

        let submission = ContactSubmission::new(
            request.name.trim().to_string(),
            request.email.trim().to_string(),
            request
                .subject
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            request.message.trim().to_string(),
        );

        let submission = self.store.insert(submission)?;
        self.metrics.record_submission_accepted();
        info!(submission_id = %submission.id, "Contact submission stored");

        let status = self.deliver(&submission).await;
        // The record may already be evicted by newer submissions; the mail went out either way.
        if let Err(e) = self.store.update_status(submission.id, status) {
            warn!(submission_id = %submission.id, error = %e, "Could not record delivery status");
        }

        Ok(ContactResponse::accepted(ACCEPTED_MESSAGE))
    }

    /// Sends both mails. Only the owner notification decides the stored status.
    async fn deliver(&self, submission: &ContactSubmission) -> SubmissionStatus {
        let status = match self.mailer.send(&notification_mail(submission, &self.recipient)).await {
            Ok(()) => {
                info!(submission_id = %submission.id, "Email notification sent");
                SubmissionStatus::Sent
            }
            Err(e) => {
                self.metrics.record_notification_failed();
                error!(submission_id = %submission.id, error = %e, "Failed to send email notification");
                SubmissionStatus::Failed
            }
        };

        if let Err(e) = self.mailer.send(&autoreply_mail(submission, &self.owner_name)).await {
            warn!(submission_id = %submission.id, error = %e, "Failed to send auto-reply");
        } else {
            info!(submission_id = %submission.id, "Auto-reply sent");
        }

        status
    }
}
