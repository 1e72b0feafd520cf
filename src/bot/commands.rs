//! Command tokens and the registry that resolves user input to a command

use std::collections::HashMap;
use teloxide::types::BotCommand;

use crate::localization::{get_localization_manager, t_lang};

/// Top-level commands of the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Start,
    Help,
    AddElement,
    RemoveElement,
    ViewTree,
    ViewCategories,
    Download,
    Upload,
    /// Fallback for anything the registry does not know
    Unknown,
}

impl Command {
    /// Every command reachable through the registry
    pub const ALL: [Command; 8] = [
        Command::Start,
        Command::Help,
        Command::AddElement,
        Command::RemoveElement,
        Command::ViewTree,
        Command::ViewCategories,
        Command::Download,
        Command::Upload,
    ];

    pub fn slash(self) -> &'static str {
        match self {
            Command::Start => "/start",
            Command::Help => "/help",
            Command::AddElement => "/addelement",
            Command::RemoveElement => "/removeelement",
            Command::ViewTree => "/viewtree",
            Command::ViewCategories => "/viewcategories",
            Command::Download => "/download",
            Command::Upload => "/upload",
            Command::Unknown => "unknown",
        }
    }

    /// Non-slash token used by inline quick-action buttons
    pub fn inline_token(self) -> Option<&'static str> {
        match self {
            Command::AddElement => Some("ADD_ELEMENT"),
            Command::RemoveElement => Some("REMOVE_ELEMENT"),
            Command::ViewTree => Some("VIEW_TREE"),
            Command::ViewCategories => Some("VIEW_CATEGORIES"),
            Command::Download => Some("DOWNLOAD"),
            Command::Upload => Some("UPLOAD"),
            Command::Start | Command::Help | Command::Unknown => None,
        }
    }

    /// Localization key of the main-menu button for this command
    pub fn menu_label_key(self) -> Option<&'static str> {
        match self {
            Command::Help => Some("menu-help"),
            Command::AddElement => Some("menu-add"),
            Command::ViewTree => Some("menu-tree"),
            Command::RemoveElement => Some("menu-remove"),
            Command::ViewCategories => Some("menu-view"),
            Command::Upload => Some("menu-import"),
            Command::Download => Some("menu-download"),
            Command::Start | Command::Unknown => None,
        }
    }

    fn description_key(self) -> &'static str {
        match self {
            Command::Start => "cmd-start",
            Command::Help => "cmd-help",
            Command::AddElement => "cmd-addelement",
            Command::RemoveElement => "cmd-removeelement",
            Command::ViewTree => "cmd-viewtree",
            Command::ViewCategories => "cmd-viewcategories",
            Command::Download => "cmd-download",
            Command::Upload => "cmd-upload",
            Command::Unknown => "unknown-command",
        }
    }
}

/// Command menu shown by Telegram clients, for `set_my_commands`
pub fn bot_commands(language_code: Option<&str>) -> Vec<BotCommand> {
    Command::ALL
        .iter()
        .map(|command| {
            BotCommand::new(
                command.slash().trim_start_matches('/'),
                t_lang(command.description_key(), language_code),
            )
        })
        .collect()
}

/// Text input split into a command token and its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedInput {
    pub token: String,
    pub args: Vec<String>,
    /// Slash command mentioning a different bot, e.g. `/help@OtherBot` in a group
    pub for_other_bot: bool,
}

/// Exact-match lookup from tokens to commands, built once at startup
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    by_token: HashMap<String, Command>,
    /// Menu button label (any language) to slash token
    labels: HashMap<String, &'static str>,
    /// Our own username; when unknown every mention is accepted
    bot_username: Option<String>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        let mut by_token = HashMap::new();
        let mut labels = HashMap::new();
        let manager = get_localization_manager();

        for command in Command::ALL {
            by_token.insert(command.slash().to_string(), command);
            if let Some(token) = command.inline_token() {
                by_token.insert(token.to_string(), command);
            }
            if let Some(key) = command.menu_label_key() {
                for lang in manager.languages() {
                    let label = manager.get_message_in_language(key, lang, None);
                    labels.insert(label, command.slash());
                }
            }
        }

        Self {
            by_token,
            labels,
            bot_username: None,
        }
    }

    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.bot_username = Some(username.into());
        self
    }

    fn is_own_mention(&self, mention: &str) -> bool {
        match self.bot_username.as_deref() {
            Some(own) => own.eq_ignore_ascii_case(mention),
            None => true,
        }
    }

    pub fn resolve(&self, token: &str) -> Option<Command> {
        self.by_token.get(token).copied()
    }

    /// Map a button label to its token, otherwise split off the first word.
    /// A `@botname` suffix on a slash command is dropped when it names this bot.
    pub fn normalize(&self, text: &str) -> NormalizedInput {
        let text = text.trim();
        if let Some(token) = self.labels.get(text) {
            return NormalizedInput {
                token: (*token).to_string(),
                args: Vec::new(),
                for_other_bot: false,
            };
        }

        let mut words = text.split_whitespace();
        let first = words.next().unwrap_or_default();
        let (token, for_other_bot) = match first.split_once('@') {
            Some((command, mention)) if command.starts_with('/') => {
                (command, !self.is_own_mention(mention))
            }
            _ => (first, false),
        };

        NormalizedInput {
            token: token.to_string(),
            args: words.map(str::to_string).collect(),
            for_other_bot,
        }
    }
}
