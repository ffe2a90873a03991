// Library crate for the score relay server
// This file exposes the public API for integration tests

pub mod bot;
pub mod config;
pub mod reset;
pub mod scores;
pub mod shared;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

// Re-export commonly used types for easier access in tests
pub use bot::{BotApi, BotError, OutgoingMessage, TelegramBotApi};
pub use config::{AppConfig, ConfigError};
pub use reset::{ResetOutcome, WeeklyReset, WeeklyWindow};
pub use scores::{InMemoryScoreRepository, ScoreRecord, ScoreRepository, SqliteScoreRepository};
pub use shared::{AppError, AppState};

/// All HTTP routes of the server
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(scores::health))
        .route("/score", post(scores::submit_score))
        .route("/leaderboard", get(scores::get_leaderboard))
        .route("/webhook/:key", post(bot::bot_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
