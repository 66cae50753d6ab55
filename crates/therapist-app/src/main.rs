//! Therapist application binary - composition root.
//!
//! 1. Load `.env`, then configuration from TOML
//! 2. Apply CLI and environment overrides
//! 3. `serve`: build the relay state, start session cleanup, serve HTTP
//! 4. `chat`: run the terminal conversation client against a relay

mod cli;
mod console;

use std::time::Duration;

use clap::Parser;

use therapist_api::{start_server, AppState};
use therapist_core::TherapistConfig;

use cli::{CliArgs, Command};

const SESSION_SWEEP_INTERVAL_SECS: u64 = 60;

fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

/// Drop idle sessions on a fixed interval for the life of the process.
async fn session_sweep_loop(state: AppState) {
    let mut interval = tokio::time::interval(Duration::from_secs(SESSION_SWEEP_INTERVAL_SECS));
    loop {
        interval.tick().await;
        let removed = state.orchestrator.purge_expired();
        if removed > 0 {
            tracing::info!(removed, "Expired sessions purged");
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is normal.
    let dotenv = dotenvy::dotenv();

    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    let mut config = TherapistConfig::load_or_default(&config_file);
    config.apply_env();
    if let Some(level) = args.resolve_log_level() {
        config.general.log_level = level;
    }

    init_tracing(&config.general.log_level);
    tracing::info!("Starting therapist v{}", env!("CARGO_PKG_VERSION"));
    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded .env");
    }
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    match args.command() {
        Command::Serve { port } => {
            config.server.port = cli::resolve_port(port, config.server.port);

            let state = AppState::from_config(config);

            let sweep_state = state.clone();
            tokio::spawn(async move {
                session_sweep_loop(sweep_state).await;
            });

            if let Err(e) = start_server(state).await {
                tracing::error!(error = %e, "Relay server stopped");
                return Err(e.into());
            }
        }
        Command::Chat { url } => {
            let port = cli::resolve_port(None, config.server.port);
            let url = cli::resolve_relay_url(url, &config.server.host, port);
            console::run(&url).await?;
        }
    }

    Ok(())
}
