//! Application state shared across route handlers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};

use plantdash_chat::{ChatRelay, ChatService};
use plantdash_core::config::PlantdashConfig;

/// Shared application state, cloned into every handler task.
#[derive(Clone)]
pub struct AppState {
    /// Configuration the server was started with.
    pub config: Arc<PlantdashConfig>,
    /// Chat relay plus transcript persistence.
    pub chat: Arc<ChatService>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
    /// Wall-clock start time reported by /health.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Build the state around any relay, so tests can swap the webhook out.
    pub fn new(config: PlantdashConfig, relay: Arc<dyn ChatRelay>) -> Self {
        let chat = ChatService::from_config(&config.chat, relay);
        Self {
            config: Arc::new(config),
            chat: Arc::new(chat),
            start_time: Instant::now(),
            started_at: Utc::now(),
        }
    }

    /// Dataset file, re-read on every data request.
    pub fn csv_path(&self) -> PathBuf {
        PathBuf::from(&self.config.data.csv_path)
    }
}
