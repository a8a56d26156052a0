use serde::{Deserialize, Serialize};

// =============================================================================
// Chat
// =============================================================================

/// Who authored a chat turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Text typed by the dashboard user.
    User,
    /// Webhook reply, or the error text that stood in for one.
    Assistant,
}

/// One message in a conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered turns of one conversation, persisted as a JSON array.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript(Vec<ChatTurn>);

impl Transcript {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a turn in memory. Persisting is a separate step.
    pub fn push(&mut self, turn: ChatTurn) {
        self.0.push(turn);
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<ChatTurn>> for Transcript {
    fn from(turns: Vec<ChatTurn>) -> Self {
        Self(turns)
    }
}

impl IntoIterator for Transcript {
    type Item = ChatTurn;
    type IntoIter = std::vec::IntoIter<ChatTurn>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
