//! CLI argument definitions for the therapist binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_RELAY_URL: &str = "http://127.0.0.1:3000";

/// Virtual therapist chat relay and terminal client.
#[derive(Parser, Debug)]
#[command(name = "therapist", version, about)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the chat relay server (default).
    Serve {
        /// Port to listen on.
        #[arg(short = 'p', long = "port")]
        port: Option<u16>,
    },
    /// Talk to a running relay from the terminal.
    Chat {
        /// Base URL of the relay.
        #[arg(short = 'u', long = "url")]
        url: Option<String>,
    },
}

impl CliArgs {
    /// Subcommand to run; `serve` when none was given.
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or(Command::Serve { port: None })
    }

    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > THERAPIST_CONFIG env var > ~/.therapist/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("THERAPIST_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log filter level. `None` means use the config value.
    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }
}

/// Resolve the relay port.
///
/// Priority: --port flag > THERAPIST_PORT env var > config file value > 3000.
pub fn resolve_port(flag: Option<u16>, config_port: u16) -> u16 {
    if let Some(p) = flag {
        return p;
    }
    if let Ok(val) = std::env::var("THERAPIST_PORT") {
        if let Ok(p) = val.parse::<u16>() {
            return p;
        }
    }
    if config_port != 0 {
        return config_port;
    }
    DEFAULT_PORT
}

/// Resolve the relay URL for the terminal client.
pub fn resolve_relay_url(flag: Option<String>, host: &str, port: u16) -> String {
    match flag {
        Some(url) => url,
        None if port != 0 => format!("http://{}:{}", host, port),
        None => DEFAULT_RELAY_URL.to_string(),
    }
}

fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".therapist").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".therapist").join("config.toml");
    }
    PathBuf::from("config.toml")
}
