//! Chat relay for plantdash.
//!
//! Persists one transcript per machine, forwards messages to the automation
//! webhook, and records each exchange as a user turn plus a reply turn.

pub mod error;
pub mod key;
pub mod relay;
pub mod service;
pub mod session;
pub mod store;

pub use error::ChatError;
pub use key::EntityKey;
pub use relay::{ChatRelay, RelayContext, Reply, ReplyKind, WebhookRelay, FALLBACK_REPLY};
pub use service::{ChatOutcome, ChatService};
pub use session::ChatSession;
pub use store::TranscriptStore;
