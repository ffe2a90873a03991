// Public API - what other modules can use
pub use handlers::{get_leaderboard, health, submit_score};
pub use models::ScoreRecord;
pub use repository::{InMemoryScoreRepository, ScoreRepository, SqliteScoreRepository};
pub use service::ScoreService;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
mod service;
pub mod types;

/// Largest leaderboard served over HTTP, also the default size
pub const LEADERBOARD_MAX: usize = 50;

/// Rows shown by the chat `/leaderboard` command
pub const CHAT_LEADERBOARD_SIZE: usize = 10;
