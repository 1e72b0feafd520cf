//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `event`: Inbound events built from teloxide updates
//! - `messenger`: Outbound send capability and its Telegram implementation
//! - `dispatcher`: Routes events to handlers, honouring the chat's session state
//! - `commands`: Command tokens, menu labels and the registry
//! - `message_handler`: Top-level commands and spreadsheet uploads
//! - `callback_handler`: Inline keyboard presses (add and removal flows)
//! - `dialogue_manager`: Text steps of the add flow
//! - `callback_data`: Callback-data wire format
//! - `ui_builder`: Creates keyboards and formats messages

pub mod callback_data;
pub mod callback_handler;
pub mod commands;
pub mod dialogue_manager;
pub mod dispatcher;
pub mod event;
pub mod message_handler;
pub mod messenger;
pub mod ui_builder;

pub use callback_data::CallbackAction;
pub use commands::{bot_commands, Command, CommandRegistry};
pub use dispatcher::{BotContext, CommandDispatcher};
pub use event::Event;
pub use messenger::{Messenger, TelegramMessenger};
