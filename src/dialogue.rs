//! Conversation state kept per chat between the steps of multi-step flows.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};
use teloxide::types::ChatId;
use tracing::debug;

/// Which multi-step flow a chat is currently inside
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No flow in progress
    #[default]
    Idle,
    AwaitingRootCategoryName,
    AwaitingChildCategoryName,
}

/// Type alias for the per-chat session dialogue
pub type SessionDialogue = Dialogue<SessionState, InMemStorage<SessionState>>;

/// Per-chat session states on top of teloxide's in-memory dialogue storage
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<InMemStorage<SessionState>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            storage: InMemStorage::new(),
        }
    }

    pub fn dialogue(&self, chat_id: ChatId) -> SessionDialogue {
        Dialogue::new(self.storage.clone(), chat_id)
    }

    /// Current state, `Idle` when the chat has none
    pub async fn get(&self, chat_id: ChatId) -> anyhow::Result<SessionState> {
        Ok(self.dialogue(chat_id).get().await?.unwrap_or_default())
    }

    pub async fn set(&self, chat_id: ChatId, state: SessionState) -> anyhow::Result<()> {
        debug!(chat_id = %chat_id, state = ?state, "Session state updated");
        self.dialogue(chat_id).update(state).await?;
        Ok(())
    }

    /// Remove the chat's state; clearing an absent state is not an error
    pub async fn clear(&self, chat_id: ChatId) {
        if self.dialogue(chat_id).exit().await.is_ok() {
            debug!(chat_id = %chat_id, "Session state cleared");
        }
    }
}

/// One transient string per chat, held between two steps of a flow
#[derive(Debug, Default)]
pub struct ScratchCache {
    values: DashMap<ChatId, String>,
}

impl ScratchCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, chat_id: ChatId, value: impl Into<String>) {
        self.values.insert(chat_id, value.into());
    }

    pub fn get(&self, chat_id: ChatId) -> Option<String> {
        self.values.get(&chat_id).map(|v| v.value().clone())
    }

    pub fn clear(&self, chat_id: ChatId) {
        self.values.remove(&chat_id);
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_session_defaults_to_idle() {
        let sessions = SessionStore::new();
        assert_eq!(sessions.get(ChatId(1)).await.unwrap(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_session_set_and_clear() {
        let sessions = SessionStore::new();
        sessions
            .set(ChatId(1), SessionState::AwaitingRootCategoryName)
            .await
            .unwrap();
        assert_eq!(
            sessions.get(ChatId(1)).await.unwrap(),
            SessionState::AwaitingRootCategoryName
        );
        // Other chats are unaffected
        assert_eq!(sessions.get(ChatId(2)).await.unwrap(), SessionState::Idle);

        sessions.clear(ChatId(1)).await;
        assert_eq!(sessions.get(ChatId(1)).await.unwrap(), SessionState::Idle);

        // Clearing twice is fine
        sessions.clear(ChatId(1)).await;
    }

    #[test]
    fn test_scratch_round_trip() {
        let scratch = ScratchCache::new();
        assert_eq!(scratch.get(ChatId(5)), None);

        scratch.put(ChatId(5), "Electronics");
        assert_eq!(scratch.get(ChatId(5)).as_deref(), Some("Electronics"));

        scratch.clear(ChatId(5));
        assert_eq!(scratch.get(ChatId(5)), None);
        assert!(scratch.is_empty());
    }

    #[test]
    fn test_session_state_default() {
        assert_eq!(SessionState::default(), SessionState::Idle);
    }
}
