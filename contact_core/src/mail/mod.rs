//! Outbound mail for the backend relay: message composition and transports

pub mod smtp;

pub use smtp::SmtpMailer;

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::MailConfig;
use crate::readiness::{acquire, Scoped};
use crate::store::ContactSubmission;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("Invalid address: {0}")]
    Address(String),

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError>;

    fn kind(&self) -> &'static str;
}

/// Writes messages to the log. Used when no SMTP host is configured.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        info!(to = %mail.to, subject = %mail.subject, "Mail not sent (no SMTP host configured)");
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "log"
    }
}

/// Keeps sent messages in memory; can be told to reject a recipient.
#[derive(Debug, Clone, Default)]
pub struct MemoryMailer {
    sent: Arc<Mutex<Vec<OutgoingMail>>>,
    reject_to: Arc<Mutex<Option<String>>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject(&self, recipient: impl Into<String>) {
        *self.reject_to.lock() = Some(recipient.into());
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        if self.reject_to.lock().as_deref() == Some(mail.to.as_str()) {
            return Err(MailError::Transport(format!("recipient {} rejected", mail.to)));
        }
        self.sent.lock().push(mail.clone());
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}

pub fn notification_mail(submission: &ContactSubmission, recipient: &str) -> OutgoingMail {
    let subject_line = submission.subject.as_deref().unwrap_or("General Inquiry");

    let body = format!(
        "New message from portfolio website:\n\n\
         Name: {}\n\
         Email: {}\n\
         Subject: {}\n\n\
         Message:\n\
         {}\n\n\
         ---\n\
         Submitted at: {}\n\
         Submission ID: {}\n",
        submission.name,
        submission.email,
        submission.subject.as_deref().unwrap_or("N/A"),
        submission.message,
        submission.timestamp.to_rfc3339(),
        submission.id,
    );

    OutgoingMail {
        to: recipient.to_string(),
        reply_to: Some(submission.email.clone()),
        subject: format!("New Portfolio Contact: {}", subject_line),
        body,
    }
}

pub fn autoreply_mail(submission: &ContactSubmission, owner_name: &str) -> OutgoingMail {
    let body = format!(
        "Hi {},\n\n\
         Thank you for reaching out through my portfolio website. I have received your message \
         and will get back to you within 48 hours.\n\n\
         Your message:\n\
         {}\n\n\
         Best regards,\n\
         {}\n",
        submission.name, submission.message, owner_name,
    );

    OutgoingMail {
        to: submission.email.clone(),
        reply_to: None,
        subject: "Thank you for contacting me!".to_string(),
        body,
    }
}

/// Picks the transport for the server. SMTP is probed with bounded backoff;
/// when it never answers the server keeps running on the log transport.
pub async fn connect_mailer(config: &MailConfig) -> Scoped<Arc<dyn Mailer>> {
    if !config.smtp_enabled() {
        info!("SMTP host not configured, contact mail will be logged only");
        return Scoped::new(Arc::new(LogMailer) as Arc<dyn Mailer>);
    }

    let mailer = match SmtpMailer::new(config) {
        Ok(mailer) => mailer,
        Err(e) => {
            warn!(error = %e, "Invalid SMTP configuration, falling back to log mailer");
            return Scoped::new(Arc::new(LogMailer) as Arc<dyn Mailer>);
        }
    };

    let probe_target = mailer.clone();
    let acquired = acquire("smtp", config.connect_policy(), move || {
        let mailer = probe_target.clone();
        async move { mailer.test_connection().await }
    })
    .await;

    match acquired {
        Ok(_) => {
            info!(host = ?config.smtp_host, port = config.smtp_port, "SMTP transport ready");
            let host = config.smtp_host.clone().unwrap_or_default();
            Scoped::new(Arc::new(mailer) as Arc<dyn Mailer>).with_teardown(move |_| {
                info!(host = %host, "SMTP transport detached");
            })
        }
        Err(e) => {
            warn!(error = %e, "SMTP unreachable, falling back to log mailer");
            Scoped::new(Arc::new(LogMailer) as Arc<dyn Mailer>)
        }
    }
}
