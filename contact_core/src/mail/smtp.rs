//! SMTP transport built on lettre's tokio executor

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{error, info};

use super::{MailError, Mailer, OutgoingMail};
use crate::config::MailConfig;

#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let host = config
            .smtp_host
            .as_deref()
            .map(str::trim)
            .filter(|host| !host.is_empty())
            .ok_or_else(|| MailError::Transport("SMTP host is not set".to_string()))?;

        let from: Mailbox = config
            .from_address
            .parse()
            .map_err(|e| MailError::Address(format!("{}: {}", config.from_address, e)))?;

        let transport = if config.smtp_username.is_empty() || config.smtp_password.is_empty() {
            info!(smtp_host = %host, smtp_port = config.smtp_port, "Using unauthenticated SMTP connection");
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
                .port(config.smtp_port)
                .build()
        } else {
            let creds = Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|e| MailError::Transport(e.to_string()))?
                .port(config.smtp_port)
                .credentials(creds)
                .build()
        };

        Ok(Self { transport, from })
    }

    pub async fn test_connection(&self) -> Result<(), MailError> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(MailError::Transport("SMTP server did not accept NOOP".to_string())),
            Err(e) => Err(MailError::Transport(e.to_string())),
        }
    }

    fn build_message(&self, mail: &OutgoingMail) -> Result<Message, MailError> {
        let to: Mailbox = mail
            .to
            .parse()
            .map_err(|e| MailError::Address(format!("{}: {}", mail.to, e)))?;

        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject.clone())
            .header(ContentType::TEXT_PLAIN);

        if let Some(reply_to) = &mail.reply_to {
            let reply_to: Mailbox = reply_to
                .parse()
                .map_err(|e| MailError::Address(format!("{}: {}", reply_to, e)))?;
            builder = builder.reply_to(reply_to);
        }

        builder
            .body(mail.body.clone())
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let message = self.build_message(mail)?;

        match self.transport.send(message).await {
            Ok(_) => {
                info!(to = %mail.to, "Mail sent via SMTP");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, to = %mail.to, "Failed to send mail via SMTP");
                Err(MailError::Transport(e.to_string()))
            }
        }
    }

    fn kind(&self) -> &'static str {
        "smtp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MailConfig {
        MailConfig {
            smtp_host: Some("localhost".to_string()),
            smtp_port: 1025,
            from_address: "Portfolio <portfolio@example.com>".to_string(),
            ..MailConfig::default()
        }
    }

    #[tokio::test]
    async fn test_builds_message_with_reply_to() {
        let mailer = SmtpMailer::new(&config()).unwrap();
        let mail = OutgoingMail {
            to: "owner@example.com".to_string(),
            reply_to: Some("ada@example.com".to_string()),
            subject: "New Portfolio Contact: Hi".to_string(),
            body: "Hello".to_string(),
        };

        let message = mailer.build_message(&mail).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("To: owner@example.com"));
        assert!(raw.contains("Reply-To: ada@example.com"));
        assert!(raw.contains("Subject: New Portfolio Contact: Hi"));
    }

    #[tokio::test]
    async fn test_rejects_bad_recipient() {
        let mailer = SmtpMailer::new(&config()).unwrap();
        let mail = OutgoingMail {
            to: "not an address".to_string(),
            reply_to: None,
            subject: "s".to_string(),
            body: "b".to_string(),
        };

        assert!(matches!(mailer.build_message(&mail), Err(MailError::Address(_))));
    }

    #[tokio::test]
    async fn test_requires_host() {
        let mut config = config();
        config.smtp_host = None;
        assert!(SmtpMailer::new(&config).is_err());

        config.smtp_host = Some("localhost".to_string());
        config.from_address = "nope".to_string();
        assert!(matches!(SmtpMailer::new(&config), Err(MailError::Address(_))));
    }
}
