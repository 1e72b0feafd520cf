//! Callback Handler module for inline keyboard presses: the add-flow
//! buttons and the removal flow.
//!
//! Handlers return the transient notification to show for the press, if
//! any; the dispatcher answers the callback query.

use anyhow::Result;
use teloxide::types::{ChatId, InlineKeyboardMarkup, MessageId, ReplyMarkup};
use tracing::{debug, info, warn};

use super::callback_data::CallbackAction;
use super::dispatcher::BotContext;
use super::ui_builder::{category_picker, parent_picker, subcategory_picker};
use crate::dialogue::SessionState;
use crate::errors::CategoryError;
use crate::localization::{t_args_lang, t_lang};

/// Show `text` in place of the pressed message, or as a new message when there is none
async fn render(
    ctx: &BotContext,
    chat_id: ChatId,
    message_id: Option<MessageId>,
    text: &str,
    keyboard: Option<InlineKeyboardMarkup>,
) -> Result<()> {
    if let Some(message_id) = message_id {
        match ctx
            .messenger
            .edit_text(chat_id, message_id, text, keyboard.clone())
            .await
        {
            Ok(()) => return Ok(()),
            Err(e) => {
                warn!(chat_id = %chat_id, error = %e, "Failed to edit message, sending a new one");
            }
        }
    }

    ctx.messenger
        .send_text(chat_id, text, keyboard.map(ReplyMarkup::InlineKeyboard))
        .await?;
    Ok(())
}

/// Root picker of the removal flow at `page`
pub async fn show_category_picker(
    ctx: &BotContext,
    chat_id: ChatId,
    message_id: Option<MessageId>,
    page: usize,
    language_code: Option<&str>,
) -> Result<()> {
    let roots = ctx.categories.roots().await?;
    if roots.is_empty() {
        return render(ctx, chat_id, message_id, &t_lang("remove-empty", language_code), None).await;
    }

    let (text, keyboard) = category_picker(&roots, page, language_code);
    render(ctx, chat_id, message_id, &text, Some(keyboard)).await
}

/// Children of `parent_id` with their delete buttons.
/// Returns `false` when the parent no longer exists.
async fn show_subcategories(
    ctx: &BotContext,
    chat_id: ChatId,
    message_id: Option<MessageId>,
    parent_id: i64,
    language_code: Option<&str>,
) -> Result<bool> {
    let Some(parent) = ctx.categories.get(parent_id).await? else {
        return Ok(false);
    };
    let children = ctx.categories.children(parent.id).await?;

    let (text, keyboard) = subcategory_picker(&parent, &children, language_code);
    render(ctx, chat_id, message_id, &text, Some(keyboard)).await?;
    Ok(true)
}

/// Removal flow: pick a root, then delete one of its children or the root itself
pub async fn handle_remove_flow_callback(
    ctx: &BotContext,
    chat_id: ChatId,
    message_id: Option<MessageId>,
    action: &CallbackAction,
    language_code: Option<&str>,
) -> Result<Option<String>> {
    let not_found = || Some(t_lang("remove-not-found", language_code));

    match action {
        CallbackAction::CategoryPage(page) => {
            show_category_picker(ctx, chat_id, message_id, *page, language_code).await?;
            Ok(None)
        }
        CallbackAction::SelectCategory(id) => {
            if show_subcategories(ctx, chat_id, message_id, *id, language_code).await? {
                Ok(None)
            } else {
                show_category_picker(ctx, chat_id, message_id, 1, language_code).await?;
                Ok(not_found())
            }
        }
        CallbackAction::DeleteSubcategory {
            child_id,
            parent_id,
        } => {
            let notification = match ctx.categories.delete(*child_id).await {
                Ok((child, removed)) => {
                    info!(chat_id = %chat_id, category_id = child.id, removed, "Subcategory removed via keyboard");
                    Some(t_args_lang(
                        "remove-subcategory-done",
                        &[("name", &child.name)],
                        language_code,
                    ))
                }
                Err(CategoryError::NotFound(_)) => not_found(),
                Err(e) => return Err(e.into()),
            };

            if !show_subcategories(ctx, chat_id, message_id, *parent_id, language_code).await? {
                show_category_picker(ctx, chat_id, message_id, 1, language_code).await?;
            }
            Ok(notification)
        }
        CallbackAction::DeleteCategory(id) => {
            let notification = match ctx.categories.delete(*id).await {
                Ok((category, removed)) => {
                    info!(chat_id = %chat_id, category_id = category.id, removed, "Category removed via keyboard");
                    Some(t_args_lang(
                        "remove-category-done",
                        &[("name", &category.name)],
                        language_code,
                    ))
                }
                Err(CategoryError::NotFound(_)) => not_found(),
                Err(e) => return Err(e.into()),
            };

            show_category_picker(ctx, chat_id, message_id, 1, language_code).await?;
            Ok(notification)
        }
        other => {
            debug!(chat_id = %chat_id, action = ?other, "Not a removal-flow action");
            Ok(None)
        }
    }
}

/// Add-flow buttons: choose root or subcategory, page through parents, pick a parent
pub async fn handle_add_flow_callback(
    ctx: &BotContext,
    chat_id: ChatId,
    message_id: Option<MessageId>,
    action: &CallbackAction,
    language_code: Option<&str>,
) -> Result<Option<String>> {
    match action {
        CallbackAction::AddCategory => {
            ctx.scratch.clear(chat_id);
            ctx.sessions
                .set(chat_id, SessionState::AwaitingRootCategoryName)
                .await?;
            ctx.messenger
                .send_text(chat_id, &t_lang("add-root-prompt", language_code), None)
                .await?;
        }
        CallbackAction::AddSubcategory => {
            show_parent_picker(ctx, chat_id, None, 1, language_code).await?;
        }
        CallbackAction::ParentPage(page) => {
            show_parent_picker(ctx, chat_id, message_id, *page, language_code).await?;
        }
        CallbackAction::SelectParent(name) => {
            // The parent is resolved again when the child name arrives
            ctx.scratch.put(chat_id, name.clone());
            ctx.sessions
                .set(chat_id, SessionState::AwaitingChildCategoryName)
                .await?;
            let prompt = t_args_lang("add-child-prompt", &[("parent", name)], language_code);
            ctx.messenger.send_text(chat_id, &prompt, None).await?;
        }
        other => {
            debug!(chat_id = %chat_id, action = ?other, "Not an add-flow action");
        }
    }
    Ok(None)
}

async fn show_parent_picker(
    ctx: &BotContext,
    chat_id: ChatId,
    message_id: Option<MessageId>,
    page: usize,
    language_code: Option<&str>,
) -> Result<()> {
    let roots = ctx.categories.roots().await?;
    if roots.is_empty() {
        ctx.messenger
            .send_text(chat_id, &t_lang("add-no-parents", language_code), None)
            .await?;
        return Ok(());
    }

    let (text, keyboard) = parent_picker(&roots, page, language_code);
    render(ctx, chat_id, message_id, &text, Some(keyboard)).await
}
