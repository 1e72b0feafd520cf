use anyhow::{Context, Result};
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use category_bot::bot::{bot_commands, BotContext, CommandDispatcher, Event, TelegramMessenger};
use category_bot::category_service::CategoryService;
use category_bot::config::{BotConfig, LogFormat};
use category_bot::db::{CategoryStore, InMemoryCategoryStore, PgCategoryStore};
use category_bot::localization::init_localization;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

/// Register the slash commands so clients can show them; failures are not fatal
async fn register_commands(bot: &Bot) {
    if let Err(e) = bot.set_my_commands(bot_commands(None)).await {
        warn!(error = %e, "Failed to register bot commands");
    }
    if let Err(e) = bot
        .set_my_commands(bot_commands(Some("ru")))
        .language_code("ru")
        .await
    {
        warn!(error = %e, lang = "ru", "Failed to register localized bot commands");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = BotConfig::from_env().context("Invalid configuration")?;
    init_tracing(config.log_format);

    info!(config = ?config, "Starting Category Telegram Bot");

    init_localization().context("Failed to load localization resources")?;

    let store: Arc<dyn CategoryStore> = match &config.database_url {
        Some(url) => {
            info!("Connecting to PostgreSQL");
            Arc::new(PgCategoryStore::connect(url, config.max_connections).await?)
        }
        None => {
            warn!("DATABASE_URL is not set, categories are kept in memory only");
            Arc::new(InMemoryCategoryStore::new())
        }
    };

    let bot = Bot::new(config.bot_token.clone());
    register_commands(&bot).await;

    let messenger = Arc::new(TelegramMessenger::new(bot.clone()));
    let mut ctx = BotContext::new(CategoryService::new(store), messenger);
    match bot.get_me().await {
        Ok(me) => match me.user.username.clone() {
            Some(username) => ctx = ctx.with_bot_username(username),
            None => warn!("Bot has no username, accepting every command mention"),
        },
        Err(e) => warn!(error = %e, "getMe failed, accepting every command mention"),
    }
    let dispatcher = CommandDispatcher::new(ctx);

    info!("Bot initialized, starting dispatcher");

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(
            |msg: Message, dispatcher: CommandDispatcher| async move {
                if let Some(event) = Event::from_message(&msg) {
                    dispatcher.dispatch(event).await;
                }
                respond(())
            },
        ))
        .branch(Update::filter_callback_query().endpoint(
            |q: CallbackQuery, dispatcher: CommandDispatcher| async move {
                if let Some(event) = Event::from_callback(&q) {
                    dispatcher.dispatch(event).await;
                }
                respond(())
            },
        ));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![dispatcher])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
