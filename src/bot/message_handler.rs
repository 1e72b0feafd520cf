//! Message Handler module: top-level commands and spreadsheet uploads

use anyhow::{Context, Result};
use teloxide::types::{ChatId, MessageId, ReplyMarkup};
use tracing::{debug, error, info, warn};

use super::callback_handler::show_category_picker;
use super::commands::Command;
use super::dispatcher::BotContext;
use super::ui_builder::{
    add_menu_keyboard, bullet_list, category_error_text, help_quick_actions_keyboard,
    main_menu_keyboard,
};
use crate::errors::CategoryError;
use crate::excel::{
    export_workbook, is_supported_file, read_import_rows, template_workbook, ImportRow,
    ProgressTracker, EXPORT_FILE_NAME, TEMPLATE_FILE_NAME,
};
use crate::localization::{t_args_lang, t_lang};
use crate::tree::{build_forest, format_tree};

/// Run a registered command (or the unknown-command fallback) for a chat
pub async fn run_command(
    ctx: &BotContext,
    command: Command,
    chat_id: ChatId,
    args: &[String],
    language_code: Option<&str>,
) -> Result<()> {
    debug!(chat_id = %chat_id, command = ?command, args = ?args, "Running command");

    match command {
        Command::Start => handle_start(ctx, chat_id, language_code).await,
        Command::Help => handle_help(ctx, chat_id, language_code).await,
        Command::AddElement => handle_add_element(ctx, chat_id, args, language_code).await,
        Command::RemoveElement => {
            show_category_picker(ctx, chat_id, None, 1, language_code).await
        }
        Command::ViewTree => handle_view_tree(ctx, chat_id, language_code).await,
        Command::ViewCategories => handle_view_categories(ctx, chat_id, language_code).await,
        Command::Download => handle_download(ctx, chat_id, language_code).await,
        Command::Upload => handle_upload(ctx, chat_id, language_code).await,
        Command::Unknown => handle_unknown(ctx, chat_id, language_code).await,
    }
}

async fn send(ctx: &BotContext, chat_id: ChatId, text: &str) -> Result<()> {
    ctx.messenger.send_text(chat_id, text, None).await?;
    Ok(())
}

async fn handle_start(ctx: &BotContext, chat_id: ChatId, language_code: Option<&str>) -> Result<()> {
    let keyboard = ReplyMarkup::Keyboard(main_menu_keyboard(language_code));
    ctx.messenger
        .send_text(chat_id, &t_lang("welcome", language_code), Some(keyboard))
        .await?;
    Ok(())
}

async fn handle_help(ctx: &BotContext, chat_id: ChatId, language_code: Option<&str>) -> Result<()> {
    let text = format!(
        "{}\n\n{}",
        t_lang("help-text", language_code),
        t_lang("help-quick-actions", language_code)
    );
    let keyboard = ReplyMarkup::InlineKeyboard(help_quick_actions_keyboard(language_code));
    ctx.messenger.send_text(chat_id, &text, Some(keyboard)).await?;
    Ok(())
}

async fn handle_unknown(ctx: &BotContext, chat_id: ChatId, language_code: Option<&str>) -> Result<()> {
    let keyboard = ReplyMarkup::Keyboard(main_menu_keyboard(language_code));
    ctx.messenger
        .send_text(chat_id, &t_lang("unknown-command", language_code), Some(keyboard))
        .await?;
    Ok(())
}

/// Reply with the localized text of a category error; store failures are logged too
pub(crate) async fn report_category_error(
    ctx: &BotContext,
    chat_id: ChatId,
    err: &CategoryError,
    language_code: Option<&str>,
) -> Result<()> {
    if err.is_validation() {
        debug!(chat_id = %chat_id, error = %err, "Rejected category input");
    } else {
        error!(chat_id = %chat_id, error = %err, "Category store failure");
    }
    send(ctx, chat_id, &category_error_text(err, language_code)).await
}

/// `/addelement`: no arguments opens the add menu, `Name` adds a root,
/// `Parent Child` adds a subcategory
async fn handle_add_element(
    ctx: &BotContext,
    chat_id: ChatId,
    args: &[String],
    language_code: Option<&str>,
) -> Result<()> {
    match args {
        [] => {
            let keyboard = ReplyMarkup::InlineKeyboard(add_menu_keyboard(language_code));
            ctx.messenger
                .send_text(chat_id, &t_lang("add-menu-title", language_code), Some(keyboard))
                .await?;
            Ok(())
        }
        [name] => match ctx.categories.create_root(name).await {
            Ok(category) => {
                let text = t_args_lang("add-root-success", &[("name", &category.name)], language_code);
                send(ctx, chat_id, &text).await
            }
            Err(e) => report_category_error(ctx, chat_id, &e, language_code).await,
        },
        [parent, child] => match ctx.categories.create_child(parent, child).await {
            Ok(category) => {
                let text = t_args_lang(
                    "add-child-success",
                    &[("name", category.name.as_str()), ("parent", parent.trim())],
                    language_code,
                );
                send(ctx, chat_id, &text).await
            }
            Err(e) => report_category_error(ctx, chat_id, &e, language_code).await,
        },
        _ => send(ctx, chat_id, &t_lang("add-usage", language_code)).await,
    }
}

async fn handle_view_tree(ctx: &BotContext, chat_id: ChatId, language_code: Option<&str>) -> Result<()> {
    let categories = ctx.categories.all().await?;
    if categories.is_empty() {
        return send(ctx, chat_id, &t_lang("tree-empty", language_code)).await;
    }

    let forest = build_forest(&categories);
    let text = format_tree(&t_lang("tree-header", language_code), &forest);
    send(ctx, chat_id, &text).await
}

/// Root names, one per line, in store order
async fn handle_view_categories(
    ctx: &BotContext,
    chat_id: ChatId,
    language_code: Option<&str>,
) -> Result<()> {
    let roots = ctx.categories.roots().await?;
    if roots.is_empty() {
        return send(ctx, chat_id, &t_lang("view-empty", language_code)).await;
    }

    let text = roots
        .iter()
        .map(|category| category.name.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    send(ctx, chat_id, &text).await
}

async fn handle_download(ctx: &BotContext, chat_id: ChatId, language_code: Option<&str>) -> Result<()> {
    let categories = ctx.categories.all().await?;
    if categories.is_empty() {
        return send(ctx, chat_id, &t_lang("download-empty", language_code)).await;
    }

    let forest = build_forest(&categories);
    let bytes = export_workbook(
        &forest,
        &t_lang("export-sheet", language_code),
        &t_lang("export-header", language_code),
    )?;
    let caption = t_args_lang(
        "download-caption",
        &[
            ("count", &categories.len().to_string()),
            ("date", &chrono::Local::now().format("%Y-%m-%d %H:%M").to_string()),
        ],
        language_code,
    );

    ctx.messenger
        .send_document(chat_id, bytes, EXPORT_FILE_NAME, Some(&caption))
        .await?;
    info!(chat_id = %chat_id, count = categories.len(), "Category export sent");
    Ok(())
}

async fn handle_upload(ctx: &BotContext, chat_id: ChatId, language_code: Option<&str>) -> Result<()> {
    let template = template_workbook(
        &t_lang("template-sheet", language_code),
        &t_lang("template-header-category", language_code),
        &t_lang("template-header-subcategory", language_code),
    )?;
    ctx.messenger
        .send_document(
            chat_id,
            template,
            TEMPLATE_FILE_NAME,
            Some(&t_lang("upload-template-caption", language_code)),
        )
        .await?;
    send(ctx, chat_id, &t_lang("upload-instructions", language_code)).await
}

/// Uploaded document: spreadsheets are imported, anything else is refused
pub async fn handle_document(
    ctx: &BotContext,
    chat_id: ChatId,
    file_name: &str,
    file_id: &str,
    language_code: Option<&str>,
) -> Result<()> {
    if !is_supported_file(file_name) {
        warn!(chat_id = %chat_id, file_name, "Unsupported upload format rejected");
        return send(ctx, chat_id, &t_lang("upload-unsupported-format", language_code)).await;
    }

    info!(chat_id = %chat_id, file_name, "Importing categories from spreadsheet");
    let bytes = match ctx.messenger.download_file(file_id).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(chat_id = %chat_id, error = %e, "Failed to download uploaded file");
            return send(ctx, chat_id, &t_lang("upload-failed", language_code)).await;
        }
    };

    let rows = match read_import_rows(&bytes) {
        Ok(rows) => rows,
        Err(e) => {
            error!(chat_id = %chat_id, error = %format!("{e:#}"), "Failed to read uploaded workbook");
            return send(ctx, chat_id, &t_lang("upload-failed", language_code)).await;
        }
    };

    import_rows(ctx, chat_id, rows, language_code).await
}

/// Counters collected while importing
#[derive(Debug, Default)]
struct ImportSummary {
    added: Vec<String>,
    duplicates: Vec<String>,
    skipped: usize,
}

/// Apply one spreadsheet row. Invalid rows are counted as skipped; only
/// store failures abort the import.
async fn import_row(
    ctx: &BotContext,
    chat_id: ChatId,
    row: &ImportRow,
    summary: &mut ImportSummary,
) -> Result<()> {
    let at_row = || format!("import failed at row {}", row.row + 1);

    if row.parent.is_empty() {
        debug!(chat_id = %chat_id, row = row.row, "Skipping row without a parent name");
        summary.skipped += 1;
        return Ok(());
    }

    let parent = match ctx.categories.find_or_create_root(&row.parent).await {
        Ok((parent, _)) => parent,
        Err(e) if e.is_validation() => {
            warn!(chat_id = %chat_id, row = row.row, error = %e, "Skipping invalid import row");
            summary.skipped += 1;
            return Ok(());
        }
        Err(e) => return Err(e).with_context(at_row),
    };

    if row.child.is_empty() {
        return Ok(());
    }

    match ctx.categories.create_child(&parent.name, &row.child).await {
        Ok(child) => summary.added.push(format!("{} -> {}", parent.name, child.name)),
        Err(CategoryError::DuplicateName(name)) => {
            debug!(chat_id = %chat_id, name = %name, "Import row is a duplicate");
            summary.duplicates.push(name);
        }
        Err(e) if e.is_validation() => {
            warn!(chat_id = %chat_id, row = row.row, error = %e, "Skipping invalid import row");
            summary.skipped += 1;
        }
        Err(e) => return Err(e).with_context(at_row),
    }

    Ok(())
}

/// Progress edits are best effort; Telegram rate-limits rapid edits of one message
async fn update_progress(ctx: &BotContext, chat_id: ChatId, progress_id: MessageId, text: &str) {
    if let Err(e) = ctx.messenger.edit_text(chat_id, progress_id, text, None).await {
        warn!(chat_id = %chat_id, error = %e, "Failed to update import progress");
    }
}

async fn import_rows(
    ctx: &BotContext,
    chat_id: ChatId,
    rows: Vec<ImportRow>,
    language_code: Option<&str>,
) -> Result<()> {
    let progress_text = |percent: u8| {
        t_args_lang("import-progress", &[("percent", &percent.to_string())], language_code)
    };
    let progress_id = ctx
        .messenger
        .send_text(chat_id, &progress_text(0), None)
        .await
        .context("failed to send import progress message")?;

    let mut progress = ProgressTracker::new(rows.len());
    let mut summary = ImportSummary::default();

    for row in rows {
        import_row(ctx, chat_id, &row, &mut summary).await?;

        if let Some(percent) = progress.advance() {
            update_progress(ctx, chat_id, progress_id, &progress_text(percent)).await;
        }
    }

    update_progress(ctx, chat_id, progress_id, &t_lang("import-done", language_code)).await;
    info!(
        chat_id = %chat_id,
        added = summary.added.len(),
        duplicates = summary.duplicates.len(),
        skipped = summary.skipped,
        "Spreadsheet import finished"
    );

    if !summary.duplicates.is_empty() {
        let text = bullet_list(&t_lang("import-duplicates", language_code), &summary.duplicates);
        send(ctx, chat_id, &text).await?;
    }
    if !summary.added.is_empty() {
        let text = bullet_list(&t_lang("import-added", language_code), &summary.added);
        send(ctx, chat_id, &text).await?;
    }
    if summary.added.is_empty() && summary.duplicates.is_empty() {
        send(ctx, chat_id, &t_lang("import-nothing", language_code)).await?;
    }
    if summary.skipped > 0 {
        let text = t_args_lang(
            "import-skipped",
            &[("count", &summary.skipped.to_string())],
            language_code,
        );
        send(ctx, chat_id, &text).await?;
    }

    Ok(())
}
