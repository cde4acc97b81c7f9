use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::readiness::RetryPolicy;
use crate::validation::ValidationProfile;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
    pub mail: MailConfig,
    pub contact: ContactConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_seconds: u64,
    pub max_stored_submissions: usize,
    /// Rules applied to drafts arriving at `/api/contact`.
    pub validation: ValidationProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// `*` allows any origin.
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub enable: bool,
    pub max_requests: usize,
    pub window_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub trace_requests: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Unset means messages are written to the log instead of sent.
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_address: String,
    pub recipient_email: String,
    pub owner_name: String,
    pub connect_attempts: u32,
    pub connect_initial_delay_ms: u64,
    pub connect_max_delay_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Direct,
    Relay,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactConfig {
    pub channel: ChannelKind,
    pub validation: ValidationProfile,
    pub notification_duration_ms: u64,
    /// Shown as the fallback address when delivery fails.
    pub owner_email: Option<String>,
    pub direct: DirectChannelConfig,
    pub relay: RelayChannelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectChannelConfig {
    pub service_id: Option<String>,
    pub notification_template: Option<String>,
    pub autoreply_template: Option<String>,
    pub public_key: Option<String>,
    pub api_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayChannelConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            request_timeout_seconds: 30,
            max_stored_submissions: 10_000,
            validation: ValidationProfile::min_message(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enable: true,
            max_requests: 5,
            window_seconds: 60,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { trace_requests: true }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_address: "portfolio@localhost".to_string(),
            recipient_email: "owner@localhost".to_string(),
            owner_name: "Portfolio Owner".to_string(),
            connect_attempts: 3,
            connect_initial_delay_ms: 500,
            connect_max_delay_ms: 4000,
        }
    }
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            channel: ChannelKind::Relay,
            validation: ValidationProfile::strict_subject(),
            notification_duration_ms: 5000,
            owner_email: None,
            direct: DirectChannelConfig::default(),
            relay: RelayChannelConfig::default(),
        }
    }
}

impl Default for DirectChannelConfig {
    fn default() -> Self {
        Self {
            service_id: None,
            notification_template: None,
            autoreply_template: None,
            public_key: None,
            api_url: "https://api.emailjs.com/api/v1.0/email/send".to_string(),
            timeout_seconds: 15,
        }
    }
}

impl Default for RelayChannelConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            timeout_seconds: 15,
        }
    }
}

impl ContactConfig {
    pub fn validation_profile(&self) -> ValidationProfile {
        self.validation
    }
}

impl MailConfig {
    pub fn connect_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.connect_attempts,
            initial_delay: Duration::from_millis(self.connect_initial_delay_ms),
            max_delay: Duration::from_millis(self.connect_max_delay_ms),
            multiplier: 2,
        }
    }

    pub fn smtp_enabled(&self) -> bool {
        self.smtp_host.as_deref().is_some_and(|host| !host.trim().is_empty())
    }
}

impl AppConfig {
    /// Defaults, then `config.toml` when present, then `APP_*` environment
    /// variables (`APP_CONTACT__CHANNEL=direct`).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    pub fn load_from(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?);

        match path {
            Some(path) => {
                builder = builder.add_source(File::with_name(path));
            }
            None if std::path::Path::new("config.toml").exists() => {
                builder = builder.add_source(File::with_name("config"));
            }
            None => {}
        }

        builder = builder.add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        app_config.validate()?;

        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port cannot be 0".to_string()));
        }

        if self.server.max_stored_submissions == 0 {
            return Err(ConfigError::Message(
                "Stored submission limit must be greater than 0".to_string(),
            ));
        }

        if self.rate_limit.enable && (self.rate_limit.max_requests == 0 || self.rate_limit.window_seconds == 0) {
            return Err(ConfigError::Message(
                "Rate limit requires a positive request count and window".to_string(),
            ));
        }

        if self.mail.smtp_enabled() && self.mail.smtp_port == 0 {
            return Err(ConfigError::Message("SMTP port cannot be 0".to_string()));
        }

        if self.mail.connect_attempts == 0 {
            return Err(ConfigError::Message(
                "Mail connect attempts must be at least 1".to_string(),
            ));
        }

        if self.contact.channel == ChannelKind::Relay {
            let base_url = self.contact.relay.base_url.trim();
            if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
                return Err(ConfigError::Message(
                    "Relay base URL must be an http(s) URL".to_string(),
                ));
            }
        }

        if self.contact.notification_duration_ms == 0 {
            return Err(ConfigError::Message(
                "Notification duration must be greater than 0".to_string(),
            ));
        }

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("No CORS origins configured - browsers on other origins cannot reach /api/contact");
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.contact.channel, ChannelKind::Relay);
        assert!(config.contact.validation.subject_required);
        assert_eq!(config.server.validation.message_min_length, Some(10));
        assert!(!config.mail.smtp_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();

        config.server.port = 0;
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.rate_limit.max_requests = 0;
        assert!(config.validate().is_err());

        config.rate_limit.enable = false;
        assert!(config.validate().is_ok());

        config = AppConfig::default();
        config.contact.relay.base_url = "localhost:3000".to_string();
        assert!(config.validate().is_err());

        config.contact.channel = ChannelKind::Direct;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bind_address() {
        let mut config = AppConfig::default();
        config.server.host = "0.0.0.0".to_string();
        config.server.port = 8080;
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_config_loading() {
        let config = AppConfig::load().expect("Should load default configuration");

        assert!(config.validate().is_ok());
        assert!(!config.server.host.is_empty());
        assert!(config.server.port > 0);
        assert!(config.contact.notification_duration_ms > 0);
    }

    #[test]
    fn test_connect_policy() {
        let policy = MailConfig::default().connect_policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_delay, Duration::from_millis(500));
        assert_eq!(policy.max_delay, Duration::from_millis(4000));
    }

    #[test]
    fn test_smtp_enabled_ignores_blank_host() {
        let mut mail = MailConfig::default();
        mail.smtp_host = Some("  ".to_string());
        assert!(!mail.smtp_enabled());

        mail.smtp_host = Some("smtp.example.com".to_string());
        assert!(mail.smtp_enabled());
    }
}
