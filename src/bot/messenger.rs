//! Outbound side of the bot: the operations handlers use to talk back to a chat

use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::{ApiError, RequestError};
use teloxide::types::{
    CallbackQueryId, ChatId, FileId, InlineKeyboardMarkup, InputFile, MessageId, ReplyMarkup,
};
use tracing::debug;

/// Send capability handed to every handler
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a text message, returning the id of the sent message
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<MessageId>;

    async fn send_document(
        &self,
        chat_id: ChatId,
        bytes: Vec<u8>,
        file_name: &str,
        caption: Option<&str>,
    ) -> Result<()>;

    /// Replace the text (and optionally the inline keyboard) of a sent message
    async fn edit_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<()>;

    /// Acknowledge a button press, optionally with a transient notification
    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()>;

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>>;
}

/// Telegram refuses edits that would leave a message unchanged
fn is_not_modified(err: &RequestError) -> bool {
    matches!(err, RequestError::Api(ApiError::MessageNotModified))
}

/// [`Messenger`] backed by the Telegram Bot API
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<MessageId> {
        let mut request = self.bot.send_message(chat_id, text);
        if let Some(markup) = markup {
            request = request.reply_markup(markup);
        }
        let message = request.await.context("sendMessage failed")?;
        Ok(message.id)
    }

    async fn send_document(
        &self,
        chat_id: ChatId,
        bytes: Vec<u8>,
        file_name: &str,
        caption: Option<&str>,
    ) -> Result<()> {
        let file = InputFile::memory(bytes).file_name(file_name.to_string());
        let mut request = self.bot.send_document(chat_id, file);
        if let Some(caption) = caption {
            request = request.caption(caption);
        }
        request.await.context("sendDocument failed")?;
        Ok(())
    }

    async fn edit_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<()> {
        let mut request = self.bot.edit_message_text(chat_id, message_id, text);
        if let Some(markup) = markup {
            request = request.reply_markup(markup);
        }
        match request.await {
            Ok(_) => Ok(()),
            // Re-rendering the page already shown, e.g. a double tap
            Err(e) if is_not_modified(&e) => {
                debug!(chat_id = %chat_id, message_id = message_id.0, "Message already up to date");
                Ok(())
            }
            Err(e) => Err(e).context("editMessageText failed"),
        }
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        let mut request = self
            .bot
            .answer_callback_query(CallbackQueryId(callback_id.to_string()));
        if let Some(text) = text {
            request = request.text(text);
        }
        request.await.context("answerCallbackQuery failed")?;
        Ok(())
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>> {
        let file = self
            .bot
            .get_file(FileId(file_id.to_string()))
            .await
            .context("getFile failed")?;
        let url = format!(
            "https://api.telegram.org/file/bot{}/{}",
            self.bot.token(),
            file.path
        );

        let response = reqwest::get(&url)
            .await
            .context("file download request failed")?
            .error_for_status()
            .context("file download returned an error status")?;
        let bytes = response.bytes().await.context("failed to read file body")?;

        debug!(file_id, size = bytes.len(), "File downloaded");
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unchanged_edit_is_recognized() {
        assert!(is_not_modified(&RequestError::Api(ApiError::MessageNotModified)));
        assert!(!is_not_modified(&RequestError::Api(ApiError::MessageToEditNotFound)));
        assert!(!is_not_modified(&RequestError::RetryAfter(
            teloxide::types::Seconds::from_seconds(3)
        )));
    }
}
