//! Dialogue Manager module: the text steps of the add flow.
//!
//! While a chat is awaiting a category name, its next text message is taken
//! as that name verbatim. Both steps leave the chat idle afterwards, whether
//! the category was created or not.

use anyhow::Result;
use teloxide::types::ChatId;
use tracing::{info, warn};

use super::dispatcher::BotContext;
use super::message_handler::report_category_error;
use crate::localization::{t_args_lang, t_lang};

/// `AwaitingRootCategoryName`: create a root category named `text`
pub async fn handle_root_name_input(
    ctx: &BotContext,
    chat_id: ChatId,
    text: &str,
    language_code: Option<&str>,
) -> Result<()> {
    let created = ctx.categories.create_root(text).await;
    ctx.sessions.clear(chat_id).await;

    match created {
        Ok(category) => {
            info!(chat_id = %chat_id, category_id = category.id, "Root category added from dialogue");
            let reply = t_args_lang("add-root-success", &[("name", &category.name)], language_code);
            ctx.messenger.send_text(chat_id, &reply, None).await?;
            Ok(())
        }
        Err(e) => report_category_error(ctx, chat_id, &e, language_code).await,
    }
}

/// `AwaitingChildCategoryName`: create `text` under the parent held in the scratch cache
pub async fn handle_child_name_input(
    ctx: &BotContext,
    chat_id: ChatId,
    text: &str,
    language_code: Option<&str>,
) -> Result<()> {
    let Some(parent_name) = ctx.scratch.get(chat_id) else {
        warn!(chat_id = %chat_id, "Awaiting a child name without a selected parent, resetting flow");
        ctx.sessions.clear(chat_id).await;
        ctx.messenger
            .send_text(chat_id, &t_lang("add-flow-expired", language_code), None)
            .await?;
        return Ok(());
    };

    let created = ctx.categories.create_child(&parent_name, text).await;
    ctx.scratch.clear(chat_id);
    ctx.sessions.clear(chat_id).await;

    match created {
        Ok(category) => {
            info!(
                chat_id = %chat_id,
                category_id = category.id,
                parent = %parent_name,
                "Child category added from dialogue"
            );
            let reply = t_args_lang(
                "add-child-success",
                &[("name", category.name.as_str()), ("parent", parent_name.as_str())],
                language_code,
            );
            ctx.messenger.send_text(chat_id, &reply, None).await?;
            Ok(())
        }
        Err(e) => report_category_error(ctx, chat_id, &e, language_code).await,
    }
}
