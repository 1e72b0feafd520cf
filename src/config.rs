//! # Configuration Module
//!
//! Runtime settings read from the process environment once `.env` has been
//! loaded by `dotenv`.

use anyhow::{bail, Context, Result};
use std::fmt;

// Environment variable names
pub const TOKEN_VAR: &str = "TELEGRAM_BOT_TOKEN";
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
pub const MAX_CONNECTIONS_VAR: &str = "DATABASE_MAX_CONNECTIONS";
pub const LOG_FORMAT_VAR: &str = "LOG_FORMAT";

pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Configuration for the bot process
#[derive(Clone)]
pub struct BotConfig {
    /// Telegram Bot API token
    pub bot_token: String,
    /// PostgreSQL URL; the in-memory store is used when absent
    pub database_url: Option<String>,
    /// Connection pool size
    pub max_connections: u32,
    pub log_format: LogFormat,
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("bot_token", &"<redacted>")
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("max_connections", &self.max_connections)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl BotConfig {
    /// Read the configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let bot_token = get(TOKEN_VAR).with_context(|| format!("{TOKEN_VAR} must be set"))?;

        let max_connections = match get(MAX_CONNECTIONS_VAR) {
            Some(raw) => {
                let value: u32 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{MAX_CONNECTIONS_VAR} must be a positive integer, got '{raw}'"))?;
                if value == 0 {
                    bail!("{MAX_CONNECTIONS_VAR} must be a positive integer, got '{raw}'");
                }
                value
            }
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let log_format = match get(LOG_FORMAT_VAR) {
            Some(raw) => LogFormat::parse(&raw)
                .with_context(|| format!("{LOG_FORMAT_VAR} must be 'pretty' or 'json', got '{raw}'"))?,
            None => LogFormat::default(),
        };

        Ok(Self {
            bot_token: bot_token.trim().to_string(),
            database_url: get(DATABASE_URL_VAR),
            max_connections,
            log_format,
        })
    }
}
