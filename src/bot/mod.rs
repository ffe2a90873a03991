// Public API - what other modules can use
pub use client::{fire_and_forget, BotApi, BotError, TelegramBotApi};
pub use handlers::bot_webhook;
pub use types::OutgoingMessage;

// Internal modules
mod client;
pub mod commands;
mod handlers;
pub mod types;
