//! # chat
//!
//! Terminal front end for one chat session: stdin lines go out, received
//! messages come back on stdout, connection state is reported on stderr.

#![deny(unsafe_code)]

mod terminal;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chat_runtime::{ClientOptions, spawn_session};
use chat_settings::{ChatSettings, LogLevel};
use clap::Parser;
use tracing::info;

/// Line-oriented WebSocket chat client.
#[derive(Parser, Debug)]
#[command(name = "chat", about = "Line-oriented WebSocket chat client")]
struct Cli {
    /// Endpoint to connect to (overrides settings).
    #[arg(long)]
    endpoint: Option<String>,

    /// Path to the settings file (default `~/.chat-session/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Diagnostic log level (overrides settings).
    #[arg(long, value_parser = parse_level)]
    log_level: Option<LogLevel>,

    /// Emit diagnostic logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    /// Command-line flags take precedence over file and environment.
    fn apply(&self, settings: &mut ChatSettings) {
        if let Some(ref endpoint) = self.endpoint {
            settings.endpoint.clone_from(endpoint);
        }
        if let Some(level) = self.log_level {
            settings.logging.level = level;
        }
        if self.log_json {
            settings.logging.json = true;
        }
    }
}

fn parse_level(s: &str) -> std::result::Result<LogLevel, String> {
    LogLevel::parse(s).ok_or_else(|| format!("unknown log level: {s}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let path = cli
        .settings
        .clone()
        .unwrap_or_else(chat_settings::settings_path);
    let mut settings = chat_settings::load_settings_from_path(&path)
        .with_context(|| format!("Failed to load settings: {}", path.display()))?;
    cli.apply(&mut settings);

    let _ = chat_logging::init_subscriber(&settings.logging);

    let endpoint = settings
        .endpoint()
        .with_context(|| format!("Invalid endpoint: {}", settings.endpoint))?;
    info!(%endpoint, "starting chat session");

    let handle = spawn_session(endpoint, ClientOptions::from(&settings.connection));
    terminal::run(handle).await
}
