//! Submission controller: the idle / sending / settled state machine behind the form

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::ContactConfig;
use crate::form::{Draft, Field, FormState};
use crate::notify::{Notification, Notifier, DEFAULT_NOTIFICATION_DURATION};
use crate::submission::{build_adapter, FailureKind, SubmissionAdapter, SubmissionError, SubmissionOutcome};
use crate::validation::{ValidationResult, Validator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum FeedbackState {
    Idle,
    Sending,
    Settled { success: bool },
}

impl FeedbackState {
    pub fn is_sending(&self) -> bool {
        matches!(self, FeedbackState::Sending)
    }
}

/// What a single submit trigger did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitReport {
    /// A submission was already in flight; nothing happened.
    Ignored,
    /// Validation failed; errors are now shown inline and nothing was sent.
    Invalid(ValidationResult),
    Completed(SubmissionOutcome),
}

/// Everything a view needs to render the form.
#[derive(Debug, Clone, Serialize)]
pub struct FormSnapshot {
    pub draft: Draft,
    pub errors: BTreeMap<Field, String>,
    pub feedback: FeedbackState,
    pub submit_enabled: bool,
}

struct ControllerState {
    form: FormState,
    feedback: FeedbackState,
}

/// Held across the adapter await. If the submit future is dropped before an
/// outcome arrives, the form goes back to `Idle` instead of staying `Sending`.
struct InFlight<'a> {
    state: &'a Mutex<ControllerState>,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(mut self, outcome: &SubmissionOutcome) {
        let mut state = self.state.lock();
        if outcome.is_success() {
            state.form.reset();
        }
        state.feedback = FeedbackState::Settled {
            success: outcome.is_success(),
        };
        self.settled = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut state = self.state.lock();
        if state.feedback.is_sending() {
            debug!("Submission abandoned before it settled");
            state.feedback = FeedbackState::Idle;
        }
    }
}

#[derive(Clone)]
pub struct ContactForm {
    state: Arc<Mutex<ControllerState>>,
    validator: Arc<Validator>,
    adapter: Arc<dyn SubmissionAdapter>,
    notifier: Arc<dyn Notifier>,
    notification_duration: Duration,
}

impl ContactForm {
    pub fn new(
        validator: Validator,
        adapter: Arc<dyn SubmissionAdapter>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(ControllerState {
                form: FormState::new(),
                feedback: FeedbackState::Idle,
            })),
            validator: Arc::new(validator),
            adapter,
            notifier,
            notification_duration: DEFAULT_NOTIFICATION_DURATION,
        }
    }

    pub fn from_config(config: &ContactConfig, notifier: Arc<dyn Notifier>) -> Result<Self, SubmissionError> {
        let adapter = build_adapter(config)?;
        let validator = Validator::from_profile(config.validation_profile());

        Ok(Self::new(validator, adapter, notifier)
            .with_notification_duration(Duration::from_millis(config.notification_duration_ms)))
    }

    pub fn with_notification_duration(mut self, duration: Duration) -> Self {
        self.notification_duration = duration;
        self
    }

    pub fn adapter_name(&self) -> &'static str {
        self.adapter.name()
    }

    pub fn set_field(&self, field: Field, value: impl Into<String>) {
        self.state.lock().form.set_field(field, value);
    }

    pub fn draft(&self) -> Draft {
        self.state.lock().form.draft().clone()
    }

    pub fn errors(&self) -> BTreeMap<Field, String> {
        self.state.lock().form.errors().clone()
    }

    pub fn feedback(&self) -> FeedbackState {
        self.state.lock().feedback
    }

    pub fn is_submit_enabled(&self) -> bool {
        !self.feedback().is_sending()
    }

    pub fn snapshot(&self) -> FormSnapshot {
        let state = self.state.lock();
        FormSnapshot {
            draft: state.form.draft().clone(),
            errors: state.form.errors().clone(),
            feedback: state.feedback,
            submit_enabled: !state.feedback.is_sending(),
        }
    }

    /// Validates, then hands the draft to the adapter and waits for its outcome.
    /// `Sending` is recorded before the adapter is awaited, so a trigger that
    /// arrives meanwhile is ignored.
    pub async fn submit(&self) -> SubmitReport {
        let draft = {
            let mut state = self.state.lock();

            if state.feedback.is_sending() {
                debug!("Submit ignored while a submission is in flight");
                return SubmitReport::Ignored;
            }

            let result = self.validator.validate(state.form.draft());
            state.form.apply_validation(&result);

            if !result.is_valid() {
                debug!(errors = result.len(), "Contact form failed validation");
                return SubmitReport::Invalid(result);
            }

            state.feedback = FeedbackState::Sending;
            state.form.draft().clone()
        };
        let in_flight = InFlight {
            state: &self.state,
            settled: false,
        };

        info!(adapter = self.adapter.name(), "Submitting contact form");
        let outcome = self.adapter.submit(&draft).await;
        in_flight.settle(&outcome);

        self.notifier.show(self.notification_for(&outcome));

        SubmitReport::Completed(outcome)
    }

    fn notification_for(&self, outcome: &SubmissionOutcome) -> Notification {
        match outcome {
            SubmissionOutcome::Success { message } => {
                Notification::success("Message sent successfully!", message.clone(), self.notification_duration)
            }
            SubmissionOutcome::Failure { message, kind } => {
                let title = match kind {
                    FailureKind::Configuration => "Configuration Error",
                    FailureKind::Delivery => "Failed to send message",
                };
                Notification::destructive(title, message.clone(), self.notification_duration)
            }
        }
    }
}
