//! Terminal front end for the contact form: fills the draft from flags and
//! submits it through the configured channel.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use contact_core::{
    AppConfig, ChannelKind, ContactForm, Field, Notification, Notifier, SubmitReport, Variant,
};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "contact", version, about = "Send a message through the portfolio contact form")]
struct Cli {
    /// Configuration file (defaults to ./config.toml when present)
    #[arg(short, long)]
    config: Option<String>,

    /// Override the configured submission channel
    #[arg(long, value_enum)]
    channel: Option<Channel>,

    /// Override the relay base URL
    #[arg(long)]
    relay_url: Option<String>,

    #[arg(long, default_value = "")]
    name: String,

    #[arg(long, default_value = "")]
    email: String,

    #[arg(long, default_value = "")]
    subject: String,

    #[arg(long, default_value = "")]
    message: String,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Channel {
    Direct,
    Relay,
}

impl From<Channel> for ChannelKind {
    fn from(channel: Channel) -> Self {
        match channel {
            Channel::Direct => ChannelKind::Direct,
            Channel::Relay => ChannelKind::Relay,
        }
    }
}

/// Prints notifications the way the page would show a toast.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn show(&self, notification: Notification) {
        match notification.variant {
            Variant::Default => println!("{}\n  {}", notification.title, notification.description),
            Variant::Destructive => {
                eprintln!("{}\n  {}", notification.title, notification.description)
            }
        }
    }
}

/// Flags win over the loaded file, so the merged result is checked again.
fn apply_overrides(
    config: &mut AppConfig,
    channel: Option<Channel>,
    relay_url: Option<String>,
) -> Result<()> {
    if let Some(channel) = channel {
        config.contact.channel = channel.into();
    }
    if let Some(url) = relay_url {
        config.contact.relay.base_url = url;
    }

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = AppConfig::load_from(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    apply_overrides(&mut config, cli.channel, cli.relay_url)?;

    let form = ContactForm::from_config(&config.contact, Arc::new(ConsoleNotifier))
        .map_err(|e| anyhow::anyhow!("Failed to set up {:?} channel: {}", config.contact.channel, e))?;

    form.set_field(Field::Name, cli.name);
    form.set_field(Field::Email, cli.email);
    form.set_field(Field::Subject, cli.subject);
    form.set_field(Field::Message, cli.message);

    let code = match form.submit().await {
        SubmitReport::Completed(outcome) if outcome.is_success() => ExitCode::SUCCESS,
        SubmitReport::Completed(_) => ExitCode::FAILURE,
        SubmitReport::Invalid(result) => {
            for (field, message) in result.errors() {
                eprintln!("--{}: {}", field, message);
            }
            ExitCode::from(2)
        }
        SubmitReport::Ignored => ExitCode::FAILURE,
    };

    Ok(code)
}
