//! Webhook relay: one JSON POST per chat message.
//!
//! Failures never propagate. Whatever happens, the caller gets a [`Reply`]
//! whose text can be shown and stored as the assistant turn.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use plantdash_core::config::WebhookConfig;

use crate::error::ChatError;

/// Reply text used when the webhook answered but without a usable `reply`.
pub const FALLBACK_REPLY: &str = "No reply received from webhook.";

/// Extra fields sent alongside the message, e.g. `machine` and `zone`.
pub type RelayContext = BTreeMap<String, String>;

/// How a relay attempt ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    /// The webhook returned a `reply` string.
    Delivered,
    /// 2xx response without a parsable `reply` field.
    Fallback,
    /// Connection failure or non-2xx status.
    ConnectionError,
    /// No response within the configured timeout.
    Timeout,
}

/// Text to record as the assistant turn, plus how it was obtained.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    pub kind: ReplyKind,
}

impl Reply {
    pub fn delivered(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: ReplyKind::Delivered,
        }
    }

    pub fn fallback() -> Self {
        Self {
            text: FALLBACK_REPLY.to_string(),
            kind: ReplyKind::Fallback,
        }
    }

    pub fn connection_error(detail: impl std::fmt::Display) -> Self {
        Self {
            text: format!("Error connecting to webhook: {}", detail),
            kind: ReplyKind::ConnectionError,
        }
    }

    pub fn timeout(after: Duration) -> Self {
        Self {
            text: format!("Webhook did not respond within {:?}.", after),
            kind: ReplyKind::Timeout,
        }
    }
}

/// Something that turns a chat message into a reply.
#[async_trait]
pub trait ChatRelay: Send + Sync {
    /// Send one message. Never fails: errors are folded into the reply.
    async fn send(&self, message: &str, context: &RelayContext) -> Reply;
}

/// HTTP relay to a fixed webhook URL. Single attempt, no retries.
#[derive(Clone)]
pub struct WebhookRelay {
    http: Client,
    url: String,
    timeout: Duration,
}

impl WebhookRelay {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ChatError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::Client(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            url: url.into(),
            timeout,
        })
    }

    pub fn from_config(config: &WebhookConfig) -> Result<Self, ChatError> {
        Self::new(&config.url, Duration::from_secs(config.timeout_secs))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// JSON body: every context field plus `message`.
    pub fn payload(message: &str, context: &RelayContext) -> serde_json::Value {
        let mut body = serde_json::Map::new();
        for (k, v) in context {
            body.insert(k.clone(), serde_json::Value::String(v.clone()));
        }
        body.insert(
            "message".to_string(),
            serde_json::Value::String(message.to_string()),
        );
        serde_json::Value::Object(body)
    }

    fn transport_failure(&self, err: reqwest::Error) -> Reply {
        if err.is_timeout() {
            warn!(target: "webhook", url = %self.url, timeout = ?self.timeout, "Webhook timed out");
            Reply::timeout(self.timeout)
        } else {
            warn!(target: "webhook", url = %self.url, error = %err, "Webhook request failed");
            Reply::connection_error(err)
        }
    }
}

#[async_trait]
impl ChatRelay for WebhookRelay {
    async fn send(&self, message: &str, context: &RelayContext) -> Reply {
        let body = Self::payload(message, context);
        debug!(
            target: "webhook",
            url = %self.url,
            context_fields = context.len(),
            "POST webhook"
        );

        let resp = match self
            .http
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => return self.transport_failure(e),
        };

        let status = resp.status();
        if !status.is_success() {
            warn!(target: "webhook", url = %self.url, %status, "Webhook returned error status");
            return Reply::connection_error(format!("server responded with {}", status));
        }

        let bytes = match resp.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return self.transport_failure(e),
        };

        match extract_reply(&bytes) {
            Some(text) => Reply::delivered(text),
            None => Reply::fallback(),
        }
    }
}

/// Pull the `reply` string out of a webhook response body.
fn extract_reply(body: &[u8]) -> Option<String> {
    let parsed: serde_json::Value = match serde_json::from_slice(body) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(target: "webhook", error = %e, "Webhook returned invalid JSON");
            return None;
        }
    };
    match parsed.get("reply") {
        Some(serde_json::Value::String(text)) => Some(text.clone()),
        Some(other) => {
            warn!(target: "webhook", reply = %other, "Webhook reply is not a string");
            None
        }
        None => {
            warn!(target: "webhook", "Webhook response has no reply field");
            None
        }
    }
}
