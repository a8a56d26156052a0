//! plantdash binary - composition root.
//!
//! 1. Parse CLI flags and load configuration from TOML
//! 2. Build the webhook relay and shared state
//! 3. Serve the dashboard and its API

mod cli;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use plantdash_api::routes;
use plantdash_api::state::AppState;
use plantdash_chat::WebhookRelay;
use plantdash_core::config::PlantdashConfig;

use cli::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    let loaded = PlantdashConfig::load_if_present(&config_file)?;
    let found = loaded.is_some();
    let mut config = loaded.unwrap_or_default();
    args.apply(&mut config);

    // RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting plantdash v{}", env!("CARGO_PKG_VERSION"));
    if found {
        tracing::info!(path = %config_file.display(), "Configuration loaded");
    } else {
        tracing::info!(path = %config_file.display(), "No config file, using defaults");
    }

    let relay = WebhookRelay::from_config(&config.webhook)?;
    tracing::info!(
        url = relay.url(),
        timeout_secs = config.webhook.timeout_secs,
        "Webhook relay ready"
    );
    tracing::info!(
        csv = %config.data.csv_path,
        history_dir = %config.chat.history_dir,
        "Data sources"
    );

    let state = AppState::new(config.clone(), Arc::new(relay));
    if let Err(e) = routes::start_server(&config, state).await {
        tracing::error!(error = %e, "Server stopped");
        return Err(e.into());
    }
    Ok(())
}
