use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt; // for `oneshot`

use score_relay::{
    build_router, config::ResetConfig, AppConfig, AppState, ScoreRepository,
    SqliteScoreRepository, WeeklyReset,
};

use super::mocks::MockBot;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub const WEBHOOK_KEY: &str = "test-hook";
pub const ADMIN_CHAT: &str = "-1001";

pub struct TestSetup {
    pub app: Router,
    pub repository: Arc<SqliteScoreRepository>,
    pub bot: MockBot,
    pub config: AppConfig,
}

pub struct TestSetupBuilder {
    bot: MockBot,
    admin_chat_id: Option<String>,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            bot: MockBot::new(),
            admin_chat_id: Some(ADMIN_CHAT.to_string()),
        }
    }

    pub fn with_unavailable_bot(mut self) -> Self {
        self.bot = MockBot::unavailable();
        self
    }

    pub fn without_admin_chat(mut self) -> Self {
        self.admin_chat_id = None;
        self
    }

    pub async fn build(self) -> TestSetup {
        let repository = Arc::new(SqliteScoreRepository::in_memory().await.unwrap());

        let mut config = AppConfig::new(
            "1:token".to_string(),
            "https://game.example/".to_string(),
            WEBHOOK_KEY.to_string(),
        );
        config.admin_chat_id = self.admin_chat_id;
        config.public_url = Some("https://scores.example".to_string());
        config.bot_timeout = Duration::from_millis(200);

        let state = AppState::new(
            repository.clone(),
            Arc::new(self.bot.clone()),
            Arc::new(config.clone()),
        );

        TestSetup {
            app: build_router(state),
            repository,
            bot: self.bot,
            config,
        }
    }
}

// ============================================================================
// Action Helpers
// ============================================================================

impl TestSetup {
    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    /// POST /score with a raw JSON body
    pub async fn submit_raw(&self, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/score")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, body) = self.send(request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    pub async fn submit(&self, user_id: &str, score: i64) -> (StatusCode, Value) {
        self.submit_raw(json!({"user_id": user_id, "score": score}))
            .await
    }

    pub async fn leaderboard(&self) -> Value {
        let request = Request::builder()
            .uri("/leaderboard")
            .body(Body::empty())
            .unwrap();
        let (status, body) = self.send(request).await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_slice(&body).unwrap()
    }

    /// Delivers a chat message to the webhook as if sent by `user_id` in `chat_id`
    pub async fn send_chat(&self, chat_id: i64, user_id: i64, text: &str) -> StatusCode {
        let update = json!({
            "update_id": 1,
            "message": {
                "message_id": 1,
                "chat": {"id": chat_id, "type": "private"},
                "from": {"id": user_id, "is_bot": false, "first_name": "Test"},
                "text": text
            }
        });
        let request = Request::builder()
            .method("POST")
            .uri(format!("/webhook/{}", WEBHOOK_KEY))
            .header("content-type", "application/json")
            .body(Body::from(update.to_string()))
            .unwrap();
        self.send(request).await.0
    }

    pub fn weekly_reset(&self) -> WeeklyReset {
        WeeklyReset::new(
            self.repository.clone(),
            Arc::new(self.bot.clone()),
            ResetConfig::default(),
            self.config.admin_chat_id.clone(),
            self.config.bot_timeout,
        )
    }

    pub async fn stored_best(&self, user_id: &str) -> Option<i64> {
        self.repository
            .get(user_id)
            .await
            .unwrap()
            .map(|record| record.best_score)
    }
}
