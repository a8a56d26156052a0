use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{DashError, Result};

/// Top-level configuration for the plantdash server.
///
/// Read from `plantdash.toml` in the working directory unless the binary is
/// pointed elsewhere. Every section falls back to its defaults when omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlantdashConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub data: DataConfig,
}

impl PlantdashConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PlantdashConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration if the file exists.
    ///
    /// A missing file gives `Ok(None)` so the caller can fall back to
    /// defaults. A file that exists but cannot be read or parsed is an error.
    pub fn load_if_present(path: &Path) -> Result<Option<Self>> {
        match Self::load(path) {
            Ok(config) => Ok(Some(config)),
            Err(DashError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Interface the HTTP server binds to.
    pub host: String,
    /// HTTP server port.
    pub port: u16,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            log_level: "info".to_string(),
        }
    }
}

/// Automation webhook the chat pages relay to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Fixed endpoint receiving `{"message", "machine"?, "zone"?}`.
    pub url: String,
    /// Seconds to wait for the webhook before giving up.
    pub timeout_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:5678/webhook/chat".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Chat transcript and sidebar settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Directory holding one `<machine>.json` transcript per machine.
    pub history_dir: String,
    /// File name of the transcript used when no machine is selected.
    pub default_file: String,
    /// Longest accepted chat message, in characters.
    pub max_message_chars: usize,
    /// Zone names offered in the sidebar.
    pub zones: Vec<String>,
    /// Machine names offered in the sidebar.
    pub machines: Vec<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_dir: "chat_history".to_string(),
            default_file: "chat_history.json".to_string(),
            max_message_chars: 4000,
            zones: vec!["Exsample".to_string(), "iso10816-3".to_string()],
            machines: [
                "FAN 2",
                "FAN 1",
                "PUMP 1",
                "PUMP 2",
                "PUMP 3",
                "BENCH TMPLT VRSPD",
                "BENCH DA3",
                "EGL-ISO10816-3",
                "FLC-ISO10816-3",
                "MV-x ISO10816-3",
                "1A-1 - Pump",
                "Gear EX",
                "Pump Gateway",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Tabular dataset settings for the data and graph pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Path of the delimited input file.
    pub csv_path: String,
    /// Row count above which the table view shows a random sample of this size.
    pub max_display_rows: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            csv_path: "merged_data.csv".to_string(),
            max_display_rows: 1000,
        }
    }
}
