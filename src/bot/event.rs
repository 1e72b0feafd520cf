//! Inbound events, decoupled from the teloxide update types

use teloxide::types::{CallbackQuery, ChatId, Message, MessageId};
use tracing::debug;

/// Everything the dispatcher reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Text {
        chat_id: ChatId,
        text: String,
        language_code: Option<String>,
    },
    Document {
        chat_id: ChatId,
        file_name: String,
        file_id: String,
        language_code: Option<String>,
    },
    Callback {
        chat_id: ChatId,
        /// Message carrying the pressed button, when Telegram still exposes it
        message_id: Option<MessageId>,
        callback_id: String,
        data: String,
        language_code: Option<String>,
    },
}

impl Event {
    pub fn chat_id(&self) -> ChatId {
        match self {
            Event::Text { chat_id, .. }
            | Event::Document { chat_id, .. }
            | Event::Callback { chat_id, .. } => *chat_id,
        }
    }

    pub fn language_code(&self) -> Option<&str> {
        match self {
            Event::Text { language_code, .. }
            | Event::Document { language_code, .. }
            | Event::Callback { language_code, .. } => language_code.as_deref(),
        }
    }

    /// Build an event from a chat message; other message kinds yield `None`
    pub fn from_message(msg: &Message) -> Option<Self> {
        let chat_id = msg.chat.id;
        let language_code = msg.from.as_ref().and_then(|user| user.language_code.clone());

        if let Some(text) = msg.text() {
            return Some(Event::Text {
                chat_id,
                text: text.to_string(),
                language_code,
            });
        }

        if let Some(doc) = msg.document() {
            return Some(Event::Document {
                chat_id,
                file_name: doc.file_name.clone().unwrap_or_default(),
                file_id: doc.file.id.0.clone(),
                language_code,
            });
        }

        debug!(chat_id = %chat_id, "Ignoring unsupported message kind");
        None
    }

    /// Build an event from a callback query; queries without a chat are dropped
    pub fn from_callback(q: &CallbackQuery) -> Option<Self> {
        let Some(message) = q.message.as_ref() else {
            debug!(user_id = %q.from.id, "Ignoring callback without a message");
            return None;
        };

        Some(Event::Callback {
            chat_id: message.chat().id,
            message_id: Some(message.id()),
            callback_id: q.id.0.clone(),
            data: q.data.clone().unwrap_or_default(),
            language_code: q.from.language_code.clone(),
        })
    }
}
