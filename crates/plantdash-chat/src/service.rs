//! Chat service: validate, relay, record, persist.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::info;

use plantdash_core::config::ChatConfig;
use plantdash_core::types::Transcript;

use crate::error::ChatError;
use crate::key::EntityKey;
use crate::relay::{ChatRelay, RelayContext, Reply};
use crate::session::ChatSession;
use crate::store::TranscriptStore;

/// Result of one chat round trip.
#[derive(Debug, Clone, Serialize)]
pub struct ChatOutcome {
    pub reply: Reply,
    /// Transcript after the two new turns were persisted.
    pub transcript: Transcript,
}

/// Ties the transcript store to a relay.
///
/// The webhook is called first, without holding any lock. Only the
/// load-append-save step is serialized, so two requests in this process
/// never overwrite each other's turns.
pub struct ChatService {
    store: TranscriptStore,
    relay: Arc<dyn ChatRelay>,
    max_message_chars: usize,
    write_lock: Mutex<()>,
}

impl ChatService {
    pub fn new(store: TranscriptStore, relay: Arc<dyn ChatRelay>, max_message_chars: usize) -> Self {
        Self {
            store,
            relay,
            max_message_chars,
            write_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &ChatConfig, relay: Arc<dyn ChatRelay>) -> Self {
        Self::new(
            TranscriptStore::from_config(config),
            relay,
            config.max_message_chars,
        )
    }

    /// Persisted transcript for the machine (or the default conversation).
    pub fn history(&self, key: Option<&EntityKey>) -> Result<Transcript, ChatError> {
        self.store.check_key(key)?;
        Ok(self.store.load(key))
    }

    /// Reject blank or oversized messages before anything is sent or stored.
    pub fn validate_message(&self, message: &str) -> Result<(), ChatError> {
        if message.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if message.chars().count() > self.max_message_chars {
            return Err(ChatError::MessageTooLong(self.max_message_chars));
        }
        Ok(())
    }

    /// Relay `message` and append exactly two turns (user, then reply or
    /// error text) to the machine's transcript.
    pub async fn send(
        &self,
        key: Option<EntityKey>,
        message: &str,
        context: &RelayContext,
    ) -> Result<ChatOutcome, ChatError> {
        self.store.check_key(key.as_ref())?;
        self.validate_message(message)?;

        let reply = self.relay.send(message, context).await;
        info!(
            machine = key.as_ref().map(EntityKey::as_str).unwrap_or("-"),
            kind = ?reply.kind,
            "Chat round trip finished"
        );

        let _guard = self.write_lock.lock().await;
        let mut session = ChatSession::open(&self.store, key);
        session.record(message, &reply);
        session.save(&self.store)?;

        Ok(ChatOutcome {
            reply,
            transcript: session.into_transcript(),
        })
    }
}
