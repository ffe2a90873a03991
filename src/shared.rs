use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::bot::BotApi;
use crate::config::AppConfig;
use crate::scores::repository::ScoreRepository;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub score_repository: Arc<dyn ScoreRepository + Send + Sync>,
    pub bot: Arc<dyn BotApi + Send + Sync>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        score_repository: Arc<dyn ScoreRepository + Send + Sync>,
        bot: Arc<dyn BotApi + Send + Sync>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            score_repository,
            bot,
            config,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InvalidParams(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
        };

        let body = Json(json!({
            "ok": false,
            "error": error_message
        }));

        (status, body).into_response()
    }
}
