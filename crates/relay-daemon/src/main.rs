//! # relay-daemon
//!
//! `relayd`: the broadcast hub process. Loads settings, starts the server,
//! and serves until Ctrl-C.

#![deny(unsafe_code)]

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use relay_core::{RelayError, logging};
use relay_server::{RelayServer, ServerConfig};
use relay_settings::loader::hub_settings_from;
use relay_settings::{HubSettings, log_level_from};

/// Relay broadcast hub.
#[derive(Parser, Debug)]
#[command(name = "relayd", about = "Relay broadcast hub")]
struct Cli {
    /// Host to bind (overrides `HOST`).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides `PORT`).
    #[arg(long)]
    port: Option<u16>,
}

impl Cli {
    /// Resolve settings: flags first, then the environment (after `.env`).
    fn settings(&self, env: impl Fn(&str) -> Option<String>) -> Result<HubSettings, RelayError> {
        let settings = hub_settings_from(|key| match key {
            "HOST" => self.host.clone().or_else(|| env(key)),
            "PORT" => self.port.map(|p| p.to_string()).or_else(|| env(key)),
            _ => env(key),
        })?;
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let dotenv = relay_settings::load_dotenv();
    logging::init_subscriber(&log_level_from(
        |key| std::env::var(key).ok(),
        HubSettings::DEFAULT_LOG_LEVEL,
    ));
    dotenv.log();
    let settings = cli.settings(|key| std::env::var(key).ok())?;

    let metrics = relay_server::metrics::install_recorder()
        .context("failed to install metrics recorder")?;
    let server = RelayServer::new(ServerConfig::from(&settings), metrics);

    let (addr, serve_task) = server.listen().await?;
    let compaction = server.spawn_compaction();
    tracing::info!(
        %addr,
        send_timeout_ms = settings.send_timeout_ms,
        compact_interval_secs = settings.compact_interval_secs,
        "relay hub ready"
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;

    tracing::info!(
        connections = server.hub().active_connection_count(),
        "shutting down"
    );
    server
        .shutdown()
        .drain(vec![serve_task, compaction], None)
        .await;
    tracing::info!("shutdown complete");
    Ok(())
}
