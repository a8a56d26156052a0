//! Error types for the chat relay.

use plantdash_core::error::DashError;

/// Errors from the chat relay.
///
/// Webhook failures are not represented here: they become reply text so the
/// conversation keeps going.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("invalid machine name: {0}")]
    InvalidKey(String),
    #[error("http client error: {0}")]
    Client(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        ChatError::Serialization(err.to_string())
    }
}

impl From<ChatError> for DashError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Io(e) => DashError::Io(e),
            other => DashError::Chat(other.to_string()),
        }
    }
}
