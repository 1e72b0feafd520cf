//! Event dispatcher: session-state short-circuit, command lookup and
//! callback routing

use anyhow::Result;
use std::sync::Arc;
use teloxide::types::{ChatId, MessageId};
use tracing::{debug, error, warn};

use super::callback_data::CallbackAction;
use super::callback_handler::{handle_add_flow_callback, handle_remove_flow_callback};
use super::commands::{Command, CommandRegistry};
use super::dialogue_manager::{handle_child_name_input, handle_root_name_input};
use super::event::Event;
use super::message_handler::{handle_document, run_command};
use super::messenger::Messenger;
use crate::category_service::CategoryService;
use crate::dialogue::{ScratchCache, SessionState, SessionStore};
use crate::localization::t_lang;

/// Shared state every handler works with
#[derive(Clone)]
pub struct BotContext {
    pub categories: CategoryService,
    pub sessions: SessionStore,
    pub scratch: Arc<ScratchCache>,
    pub messenger: Arc<dyn Messenger>,
    pub registry: Arc<CommandRegistry>,
}

impl BotContext {
    /// Context with fresh session and scratch stores
    pub fn new(categories: CategoryService, messenger: Arc<dyn Messenger>) -> Self {
        Self {
            categories,
            sessions: SessionStore::new(),
            scratch: Arc::new(ScratchCache::new()),
            messenger,
            registry: Arc::new(CommandRegistry::new()),
        }
    }

    /// Only accept `/command@name` mentions of this bot
    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.registry = Arc::new(CommandRegistry::new().with_bot_username(username));
        self
    }
}

/// Routes inbound events to handlers
#[derive(Clone)]
pub struct CommandDispatcher {
    ctx: BotContext,
}

impl CommandDispatcher {
    pub fn new(ctx: BotContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &BotContext {
        &self.ctx
    }

    /// Handle one event. Failures are logged and reported to the chat, never returned.
    pub async fn dispatch(&self, event: Event) {
        let chat_id = event.chat_id();
        let language_code = event.language_code().map(str::to_string);
        debug!(chat_id = %chat_id, event = ?event, "Dispatching event");

        let result = match event {
            Event::Text {
                chat_id,
                text,
                language_code,
            } => self.on_text(chat_id, &text, language_code.as_deref()).await,
            Event::Document {
                chat_id,
                file_name,
                file_id,
                language_code,
            } => {
                handle_document(&self.ctx, chat_id, &file_name, &file_id, language_code.as_deref())
                    .await
            }
            Event::Callback {
                chat_id,
                message_id,
                callback_id,
                data,
                language_code,
            } => {
                self.on_callback(chat_id, message_id, &callback_id, &data, language_code.as_deref())
                    .await
            }
        };

        if let Err(e) = result {
            error!(chat_id = %chat_id, error = %format!("{e:#}"), "Failed to handle event");
            let notice = t_lang("error-generic", language_code.as_deref());
            if let Err(e) = self.ctx.messenger.send_text(chat_id, &notice, None).await {
                error!(chat_id = %chat_id, error = %e, "Failed to send failure notice");
            }
        }
    }

    async fn on_text(&self, chat_id: ChatId, text: &str, language_code: Option<&str>) -> Result<()> {
        // An active flow consumes the text before any command lookup
        match self.ctx.sessions.get(chat_id).await? {
            SessionState::AwaitingRootCategoryName => {
                return handle_root_name_input(&self.ctx, chat_id, text, language_code).await;
            }
            SessionState::AwaitingChildCategoryName => {
                return handle_child_name_input(&self.ctx, chat_id, text, language_code).await;
            }
            SessionState::Idle => {}
        }

        let input = self.ctx.registry.normalize(text);
        if input.for_other_bot {
            debug!(chat_id = %chat_id, token = %input.token, "Command addressed to another bot, ignoring");
            return Ok(());
        }
        let command = self.ctx.registry.resolve(&input.token).unwrap_or_else(|| {
            debug!(chat_id = %chat_id, token = %input.token, "No handler registered for token");
            Command::Unknown
        });

        run_command(&self.ctx, command, chat_id, &input.args, language_code).await
    }

    async fn on_callback(
        &self,
        chat_id: ChatId,
        message_id: Option<MessageId>,
        callback_id: &str,
        data: &str,
        language_code: Option<&str>,
    ) -> Result<()> {
        let action = CallbackAction::parse(data);
        debug!(chat_id = %chat_id, action = ?action, "Routing callback");

        let outcome = match &action {
            CallbackAction::CategoryPage(_)
            | CallbackAction::SelectCategory(_)
            | CallbackAction::DeleteSubcategory { .. }
            | CallbackAction::DeleteCategory(_) => {
                handle_remove_flow_callback(&self.ctx, chat_id, message_id, &action, language_code)
                    .await
            }
            CallbackAction::AddCategory
            | CallbackAction::AddSubcategory
            | CallbackAction::ParentPage(_)
            | CallbackAction::SelectParent(_) => {
                handle_add_flow_callback(&self.ctx, chat_id, message_id, &action, language_code)
                    .await
            }
            CallbackAction::Other(token) => match self.ctx.registry.resolve(token) {
                Some(command) => run_command(&self.ctx, command, chat_id, &[], language_code)
                    .await
                    .map(|()| None),
                None => {
                    warn!(chat_id = %chat_id, data = %token, "Ignoring unrecognized callback data");
                    Ok(None)
                }
            },
        };

        // Every press is answered once, with the notification when there is one
        let notification = outcome.as_ref().ok().and_then(|text| text.as_deref());
        if let Err(e) = self
            .ctx
            .messenger
            .answer_callback(callback_id, notification)
            .await
        {
            error!(chat_id = %chat_id, error = %e, "Failed to answer callback query");
        }

        outcome.map(|_| ())
    }
}
