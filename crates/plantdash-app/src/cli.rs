//! Command-line arguments for the plantdash binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use plantdash_core::config::PlantdashConfig;

/// Config file looked up in the working directory when nothing else is given.
pub const DEFAULT_CONFIG_FILE: &str = "plantdash.toml";

/// plantdash - machine-monitoring dashboard with a webhook chat assistant.
#[derive(Parser, Debug, Default)]
#[command(name = "plantdash", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// HTTP server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Webhook the chat pages relay messages to.
    #[arg(long = "webhook-url")]
    pub webhook_url: Option<String>,

    /// Delimited data file shown on the data pages.
    #[arg(long = "csv")]
    pub csv: Option<PathBuf>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > PLANTDASH_CONFIG env var > ./plantdash.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("PLANTDASH_CONFIG") {
            return PathBuf::from(p);
        }
        PathBuf::from(DEFAULT_CONFIG_FILE)
    }

    /// Resolve the HTTP port.
    ///
    /// Priority: --port flag > PLANTDASH_PORT env var > config file value.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        match std::env::var("PLANTDASH_PORT").map(|v| v.parse::<u16>()) {
            Ok(Ok(p)) => p,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Ignoring invalid PLANTDASH_PORT");
                config_port
            }
            Err(_) => config_port,
        }
    }

    /// Resolve the webhook URL.
    ///
    /// Priority: --webhook-url flag > PLANTDASH_WEBHOOK_URL env var > config.
    pub fn resolve_webhook_url(&self, config_url: &str) -> String {
        if let Some(ref url) = self.webhook_url {
            return url.clone();
        }
        std::env::var("PLANTDASH_WEBHOOK_URL").unwrap_or_else(|_| config_url.to_string())
    }

    /// Fold every override into the loaded configuration.
    pub fn apply(&self, config: &mut PlantdashConfig) {
        config.general.port = self.resolve_port(config.general.port);
        config.webhook.url = self.resolve_webhook_url(&config.webhook.url);
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(ref csv) = self.csv {
            config.data.csv_path = csv.to_string_lossy().to_string();
        }
    }
}
