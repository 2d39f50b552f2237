use std::sync::Arc;

use parley_storage::KeyValueStore;

use super::formatter::format_reply;
use super::message::{Message, Role, StoredMessage};

/// Storage key holding the serialized conversation history.
pub const MESSAGES_KEY: &str = "chatMessages";

/// Translation boundary between the in-memory history and durable storage.
///
/// Holds no state of its own; every `save` replaces the whole stored document.
#[derive(Clone)]
pub struct MessageStore {
    storage: Arc<dyn KeyValueStore>,
}

impl MessageStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Restores the history. Missing, unreadable or malformed payloads yield an empty history.
    pub fn load(&self) -> Vec<Message> {
        let payload = match self.storage.get(MESSAGES_KEY) {
            Ok(Some(payload)) => payload,
            Ok(None) => return Vec::new(),
            Err(error) => {
                tracing::warn!("failed to read chat history, starting empty: {error}");
                return Vec::new();
            }
        };

        let stored = match serde_json::from_str::<Vec<StoredMessage>>(&payload) {
            Ok(stored) => stored,
            Err(error) => {
                tracing::warn!(
                    payload_len = payload.len(),
                    "discarding malformed chat history: {error}"
                );
                return Vec::new();
            }
        };

        stored.into_iter().map(hydrate).collect()
    }

    /// Writes the full history, replacing any previous value.
    pub fn save(&self, history: &[Message]) {
        let stored = history.iter().map(Message::to_stored).collect::<Vec<_>>();
        let payload = match serde_json::to_string(&stored) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::warn!("failed to serialize chat history: {error}");
                return;
            }
        };

        if let Err(error) = self.storage.set(MESSAGES_KEY, &payload) {
            tracing::warn!(
                message_count = history.len(),
                "failed to persist chat history, keeping it in memory only: {error}"
            );
        }
    }
}

fn hydrate(stored: StoredMessage) -> Message {
    match stored.role {
        Role::User => Message::user(stored.content),
        Role::Assistant => Message::assistant(format_reply(&stored.content)),
    }
}
