//! `relay-chat`: interactive client. Prints everything broadcast on the hub
//! and submits each stdin line as a message.

#![deny(unsafe_code)]

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use relay_client::RelayClient;
use relay_client::listener::run_listener;
use relay_client::publisher::run_publisher;
use relay_core::identity::{derive_user, format_timestamp};
use relay_core::{RelayError, logging};
use relay_settings::loader::client_settings_from;
use relay_settings::{ClientSettings, log_level_from};
use tokio::io::BufReader;

/// Relay chat client.
#[derive(Parser, Debug)]
#[command(name = "relay-chat", about = "Relay chat client")]
struct Cli {
    /// Specify your username.
    #[arg(long, default_value = "Anonymous")]
    name: String,
}

/// Resolve client settings, as process-level errors.
fn settings(env: impl Fn(&str) -> Option<String>) -> Result<ClientSettings, RelayError> {
    Ok(client_settings_from(env)?)
}

#[tokio::main]
async fn main() {
    let code = match run(Cli::parse()).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("error: {e:#}");
            1
        }
    };
    // A blocked stdin read would otherwise hold the runtime open.
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<()> {
    let dotenv = relay_settings::load_dotenv();
    logging::init_subscriber(&log_level_from(
        |key| std::env::var(key).ok(),
        ClientSettings::DEFAULT_LOG_LEVEL,
    ));
    dotenv.log();
    let settings = settings(|key| std::env::var(key).ok())?;

    let timestamp = format_timestamp(Utc::now());
    let user = derive_user(&cli.name, &timestamp);
    tracing::info!(user_id = %user.id, name = %user.name, "starting chat session");

    let client = RelayClient::new(settings.target());
    let subscription = client.connect(&user).await?;

    let listener = run_listener(subscription.messages(), tokio::io::stdout());
    let publisher = run_publisher(
        BufReader::new(tokio::io::stdin()),
        &client,
        &user,
        &timestamp,
        tokio::io::stdout(),
    );

    tokio::select! {
        (reason, stats) = async { tokio::join!(listener, publisher) } => {
            tracing::debug!(%reason, sent = stats.sent, failed = stats.failed, "session ended");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::debug!("interrupted");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn missing_port_is_config_missing() {
        let err = settings(env(&[("HUB_HOST", "hub")])).unwrap_err();
        assert!(matches!(err, RelayError::ConfigMissing { ref key } if key == "PORT"));
        assert!(err.is_fatal());
    }

    #[test]
    fn invalid_port_is_invalid_config() {
        let err = settings(env(&[("PORT", "chat")])).unwrap_err();
        assert!(matches!(err, RelayError::InvalidConfig { ref value, .. } if value == "chat"));
    }

    #[test]
    fn target_from_environment() {
        let s = settings(env(&[("PORT", "7000"), ("HUB_HOST", "hub")])).unwrap();
        assert_eq!(s.target(), "hub:7000");
    }

    #[test]
    fn name_defaults_to_anonymous() {
        let cli = Cli::parse_from(["relay-chat"]);
        assert_eq!(cli.name, "Anonymous");
    }

    #[test]
    fn name_flag() {
        let cli = Cli::parse_from(["relay-chat", "--name", "alice"]);
        assert_eq!(cli.name, "alice");
    }
}
