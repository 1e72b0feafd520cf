//! # Category Telegram Bot
//!
//! A Telegram bot for managing a hierarchical category tree through
//! commands, inline keyboards and Excel import/export.

pub mod bot;
pub mod category_service;
pub mod config;
pub mod db;
pub mod dialogue;
pub mod errors;
pub mod excel;
pub mod localization;
pub mod tree;
