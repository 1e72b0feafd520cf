//! Shared helpers for the dispatcher integration tests

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex};
use teloxide::types::{
    ChatId, InlineKeyboardButtonKind, InlineKeyboardMarkup, MessageId, ReplyMarkup,
};

use category_bot::bot::{BotContext, CommandDispatcher, Event, Messenger};
use category_bot::category_service::CategoryService;
use category_bot::db::InMemoryCategoryStore;
use category_bot::localization::init_localization;

pub const CHAT: ChatId = ChatId(42);
pub const LANG: Option<&str> = Some("en");

/// One outbound operation captured by [`RecordingMessenger`]
#[derive(Debug, Clone)]
pub enum Sent {
    Text {
        chat_id: ChatId,
        text: String,
        markup: Option<ReplyMarkup>,
    },
    Document {
        chat_id: ChatId,
        file_name: String,
        caption: Option<String>,
        bytes: Vec<u8>,
    },
    Edit {
        chat_id: ChatId,
        message_id: MessageId,
        text: String,
        markup: Option<InlineKeyboardMarkup>,
    },
    Answer {
        callback_id: String,
        text: Option<String>,
    },
}

/// Messenger double that records every call and can be told to fail
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<Sent>>,
    next_message_id: AtomicI32,
    fail: AtomicBool,
    fail_edits: AtomicBool,
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl RecordingMessenger {
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Make only message edits fail, as Telegram does under rate limiting
    pub fn set_failing_edits(&self, fail: bool) {
        self.fail_edits.store(fail, Ordering::SeqCst);
    }

    pub fn add_file(&self, file_id: &str, bytes: Vec<u8>) {
        self.files.lock().unwrap().insert(file_id.to_string(), bytes);
    }

    /// Drain everything recorded so far
    pub fn take(&self) -> Vec<Sent> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    fn record(&self, sent: Sent) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("simulated network failure"));
        }
        self.sent.lock().unwrap().push(sent);
        Ok(())
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<MessageId> {
        self.record(Sent::Text {
            chat_id,
            text: text.to_string(),
            markup,
        })?;
        Ok(MessageId(self.next_message_id.fetch_add(1, Ordering::SeqCst) + 100))
    }

    async fn send_document(
        &self,
        chat_id: ChatId,
        bytes: Vec<u8>,
        file_name: &str,
        caption: Option<&str>,
    ) -> Result<()> {
        self.record(Sent::Document {
            chat_id,
            file_name: file_name.to_string(),
            caption: caption.map(str::to_string),
            bytes,
        })
    }

    async fn edit_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<()> {
        if self.fail_edits.load(Ordering::SeqCst) {
            return Err(anyhow!("simulated edit failure"));
        }
        self.record(Sent::Edit {
            chat_id,
            message_id,
            text: text.to_string(),
            markup,
        })
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        self.record(Sent::Answer {
            callback_id: callback_id.to_string(),
            text: text.map(str::to_string),
        })
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(file_id)
            .cloned()
            .ok_or_else(|| anyhow!("unknown file id {file_id}"))
    }
}

pub struct Harness {
    pub dispatcher: CommandDispatcher,
    pub messenger: Arc<RecordingMessenger>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(|ctx| ctx)
    }

    /// Harness for a bot that knows its own username
    pub fn named(username: &str) -> Self {
        Self::build(|ctx| ctx.with_bot_username(username))
    }

    fn build(configure: impl FnOnce(BotContext) -> BotContext) -> Self {
        init_localization().expect("localization resources must load");
        let messenger = Arc::new(RecordingMessenger::default());
        let categories = CategoryService::new(Arc::new(InMemoryCategoryStore::new()));
        let ctx = configure(BotContext::new(categories, messenger.clone()));
        Self {
            dispatcher: CommandDispatcher::new(ctx),
            messenger,
        }
    }

    pub fn ctx(&self) -> &BotContext {
        self.dispatcher.context()
    }

    pub async fn text(&self, text: &str) -> Vec<Sent> {
        self.dispatcher
            .dispatch(Event::Text {
                chat_id: CHAT,
                text: text.to_string(),
                language_code: LANG.map(str::to_string),
            })
            .await;
        self.messenger.take()
    }

    pub async fn press(&self, data: &str) -> Vec<Sent> {
        self.dispatcher
            .dispatch(Event::Callback {
                chat_id: CHAT,
                message_id: Some(MessageId(1)),
                callback_id: format!("cb-{data}"),
                data: data.to_string(),
                language_code: LANG.map(str::to_string),
            })
            .await;
        self.messenger.take()
    }

    pub async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Vec<Sent> {
        self.messenger.add_file("file-1", bytes);
        self.dispatcher
            .dispatch(Event::Document {
                chat_id: CHAT,
                file_name: file_name.to_string(),
                file_id: "file-1".to_string(),
                language_code: LANG.map(str::to_string),
            })
            .await;
        self.messenger.take()
    }

    /// Create categories from `(name, parent)` pairs, parents first
    pub async fn seed(&self, rows: &[(&str, Option<&str>)]) {
        for (name, parent) in rows {
            match parent {
                Some(parent) => self.ctx().categories.create_child(parent, name).await,
                None => self.ctx().categories.create_root(name).await,
            }
            .expect("seed category");
        }
    }

    pub async fn id_of(&self, name: &str) -> i64 {
        self.ctx()
            .categories
            .find_by_name(name)
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("category {name} should exist"))
            .id
    }
}

/// Texts of sent and edited messages, in order
pub fn texts(sent: &[Sent]) -> Vec<String> {
    sent.iter()
        .filter_map(|s| match s {
            Sent::Text { text, .. } | Sent::Edit { text, .. } => Some(text.clone()),
            _ => None,
        })
        .collect()
}

/// Callback answers, in order
pub fn answers(sent: &[Sent]) -> Vec<Option<String>> {
    sent.iter()
        .filter_map(|s| match s {
            Sent::Answer { text, .. } => Some(text.clone()),
            _ => None,
        })
        .collect()
}

/// Callback data of every button of an inline keyboard
pub fn callback_data(markup: &InlineKeyboardMarkup) -> Vec<String> {
    markup
        .inline_keyboard
        .iter()
        .flatten()
        .filter_map(|button| match &button.kind {
            InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
            _ => None,
        })
        .collect()
}

/// Callback data of the last inline keyboard sent or edited
pub fn last_keyboard(sent: &[Sent]) -> Vec<String> {
    sent.iter()
        .rev()
        .find_map(|s| match s {
            Sent::Text {
                markup: Some(ReplyMarkup::InlineKeyboard(markup)),
                ..
            }
            | Sent::Edit {
                markup: Some(markup),
                ..
            } => Some(callback_data(markup)),
            _ => None,
        })
        .unwrap_or_default()
}
