//! Per-request conversation state.

use plantdash_core::types::{ChatTurn, Transcript};

use crate::error::ChatError;
use crate::key::EntityKey;
use crate::relay::Reply;
use crate::store::TranscriptStore;

/// The selected machine and its transcript, threaded explicitly through a
/// chat request instead of living in process-wide state.
#[derive(Debug, Clone)]
pub struct ChatSession {
    key: Option<EntityKey>,
    transcript: Transcript,
}

impl ChatSession {
    /// Load the persisted transcript for `key`.
    pub fn open(store: &TranscriptStore, key: Option<EntityKey>) -> Self {
        let transcript = store.load(key.as_ref());
        Self { key, transcript }
    }

    pub fn key(&self) -> Option<&EntityKey> {
        self.key.as_ref()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn into_transcript(self) -> Transcript {
        self.transcript
    }

    /// Add one turn in memory. Call [`ChatSession::save`] to persist.
    pub fn append(&mut self, turn: ChatTurn) {
        self.transcript.push(turn);
    }

    /// Record a full round trip: the user's message, then the reply text
    /// (which may be an error message standing in for a reply).
    pub fn record(&mut self, message: &str, reply: &Reply) {
        self.append(ChatTurn::user(message));
        self.append(ChatTurn::assistant(reply.text.clone()));
    }

    pub fn save(&self, store: &TranscriptStore) -> Result<(), ChatError> {
        store.save(self.key.as_ref(), &self.transcript)
    }
}
