//! Parley application binary - composition root.
//!
//! Ties together all Parley crates into a single executable:
//! 1. Parse CLI args and load configuration from TOML
//! 2. Open SQLite storage and run migrations
//! 3. Bootstrap the local user and session token
//! 4. Wire the transcriber, tools, and chat orchestrator
//! 5. Start the axum REST API server

mod cli;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use parley_api::state::AppState;
use parley_api::{auth, routes};
use parley_core::config::ParleyConfig;
use parley_provider::GeminiTranscriber;
use parley_storage::{Database, UserRepository};

/// Email of the single local user created on first run.
const BOOTSTRAP_EMAIL: &str = "user@parley.local";

/// Expand ~ to home directory in a path string.
fn resolve_data_dir(data_dir: &str) -> PathBuf {
    if data_dir.starts_with("~/") || data_dir.starts_with("~\\") {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(&data_dir[2..])
    } else {
        PathBuf::from(data_dir)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = cli::CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = ParleyConfig::load_or_default(&config_file);
    if let Some(dir) = args.resolve_data_dir() {
        config.general.data_dir = dir;
    }
    if let Some(level) = args.resolve_log_level() {
        config.general.log_level = level;
    }
    config.general.port = args.resolve_port(config.general.port);

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(config.general.log_level.clone())
            }),
        )
        .init();

    tracing::info!("Starting Parley v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Storage.
    let data_dir = resolve_data_dir(&config.general.data_dir);
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
        return Err(e.into());
    }

    let db_path = data_dir.join("parley.db");
    let database = Arc::new(Database::new(&db_path)?);
    tracing::info!(path = %db_path.display(), "SQLite database opened");

    // Bootstrap the local user and a persistent session token.
    let users = UserRepository::new(Arc::clone(&database));
    let user_id = match users.find_by_email(BOOTSTRAP_EMAIL)? {
        Some(id) => id,
        None => {
            let id = users.create(BOOTSTRAP_EMAIL)?;
            tracing::info!(email = BOOTSTRAP_EMAIL, "Local user created");
            id
        }
    };

    let token = auth::load_or_generate_token(&data_dir.join("session.token"));

    // Voice transcription via a hosted multimodal model.
    let speech = Arc::new(GeminiTranscriber::new(
        config.voice.model.clone(),
        config.voice.api_key_env.clone(),
    ));

    let upload_dir = data_dir.join("uploads");

    let state = AppState::new(config, database, speech, upload_dir)?;
    state.sessions.create(&token, user_id)?;

    tracing::info!("Chat orchestrator and tools wired");

    routes::start_server(state).await?;

    Ok(())
}
