use axum::{
    body::Bytes,
    extract::{Query, State},
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    service::ScoreService,
    types::{LeaderboardQuery, LeaderboardResponse, ScoreResponse, ScoreSubmission},
    LEADERBOARD_MAX,
};
use crate::shared::{AppError, AppState};

fn service(state: &AppState) -> ScoreService {
    ScoreService::new(
        Arc::clone(&state.score_repository),
        Arc::clone(&state.bot),
        state.config.bot_timeout,
    )
}

/// HTTP handler for score submissions
///
/// POST /score
/// Body is read leniently: malformed JSON counts as an empty submission
#[instrument(name = "submit_score", skip(state, body))]
pub async fn submit_score(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ScoreResponse>, AppError> {
    let submission = ScoreSubmission::from_body(&body)
        .validate()
        .inspect_err(|e| warn!(error = %e, "Rejected score submission"))?;

    let best = service(&state).submit(submission).await?;

    Ok(Json(ScoreResponse { ok: true, best }))
}

/// HTTP handler for the leaderboard
///
/// GET /leaderboard?limit=N
/// A query string that cannot be read falls back to the full board
#[instrument(name = "get_leaderboard", skip(state))]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    query: Option<Query<LeaderboardQuery>>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    let limit = query.map(|Query(query)| query.limit()).unwrap_or(LEADERBOARD_MAX);

    let top = service(&state).leaderboard(limit).await?;

    info!(entries = top.len(), "Leaderboard served");
    Ok(Json(LeaderboardResponse { ok: true, top }))
}

/// GET /health
pub async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scores::repository::{InMemoryScoreRepository, ScoreRepository};
    use crate::shared::test_utils::{AppStateBuilder, RecordingBot};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
        routing::{get, post},
        Router,
    };
    use chrono::{Duration, Utc};
    use serde_json::Value;
    use tower::ServiceExt; // for `oneshot`

    fn app(state: AppState) -> Router {
        Router::new()
            .route("/score", post(submit_score))
            .route("/leaderboard", get(get_leaderboard))
            .route("/health", get(health))
            .with_state(state)
    }

    fn post_score(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/score")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_submit_score_handler() {
        let repo = Arc::new(InMemoryScoreRepository::new());
        let state = AppStateBuilder::new()
            .with_score_repository(repo.clone())
            .build();

        let response = app(state)
            .oneshot(post_score(r#"{"user_id": "alice", "score": 10}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"ok": true, "best": 10})
        );
        assert_eq!(repo.get("alice").await.unwrap().unwrap().best_score, 10);
    }

    #[tokio::test]
    async fn test_submit_score_negative_is_rejected() {
        let repo = Arc::new(InMemoryScoreRepository::new());
        let state = AppStateBuilder::new()
            .with_score_repository(repo.clone())
            .build();

        let response = app(state)
            .oneshot(post_score(r#"{"user_id": "alice", "score": -1}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"ok": false, "error": "bad params"})
        );
        assert!(repo.top_n(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_score_malformed_json_is_rejected() {
        let state = AppStateBuilder::new().build();

        let response = app(state)
            .oneshot(post_score(r#"{"user_id": "ali"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_submit_score_mirror_failure_still_succeeds() {
        let bot = Arc::new(RecordingBot::failing());
        let state = AppStateBuilder::new().with_bot(bot.clone()).build();

        let response = app(state)
            .oneshot(post_score(r#"{"user_id": 5551234, "score": "8"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["best"], 8);
        assert_eq!(bot.sent_game_scores().await, vec![(5551234, 8)]);
    }

    #[tokio::test]
    async fn test_leaderboard_empty() {
        let state = AppStateBuilder::new().build();

        let response = app(state)
            .oneshot(get_request("/leaderboard"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"ok": true, "top": []})
        );
    }

    #[tokio::test]
    async fn test_leaderboard_caps_at_fifty() {
        let repo = Arc::new(InMemoryScoreRepository::new());
        let start = Utc::now();
        for i in 0..60 {
            repo.upsert_best(&format!("player-{}", i), i, start + Duration::seconds(i))
                .await
                .unwrap();
        }
        let state = AppStateBuilder::new().with_score_repository(repo).build();

        let response = app(state.clone())
            .oneshot(get_request("/leaderboard"))
            .await
            .unwrap();
        let body = json_body(response).await;
        let top = body["top"].as_array().unwrap();
        assert_eq!(top.len(), 50);
        assert_eq!(top[0], serde_json::json!({"user_id": "player-59", "best": 59}));

        let response = app(state.clone())
            .oneshot(get_request("/leaderboard?limit=500"))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["top"].as_array().unwrap().len(), 50);

        let response = app(state)
            .oneshot(get_request("/leaderboard?limit=3"))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["top"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_leaderboard_ignores_unreadable_limit() {
        let repo = Arc::new(InMemoryScoreRepository::new());
        let start = Utc::now();
        for i in 0..55 {
            repo.upsert_best(&format!("player-{}", i), i, start + Duration::seconds(i))
                .await
                .unwrap();
        }
        let state = AppStateBuilder::new().with_score_repository(repo).build();

        for uri in [
            "/leaderboard?limit=abc",
            "/leaderboard?limit=-1",
            "/leaderboard?limit=2&limit=3",
        ] {
            let response = app(state.clone()).oneshot(get_request(uri)).await.unwrap();

            assert_eq!(response.status(), StatusCode::OK, "{uri}");
            let body = json_body(response).await;
            assert_eq!(body["ok"], true, "{uri}");
            assert_eq!(body["top"].as_array().unwrap().len(), 50, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(AppStateBuilder::new().build())
            .oneshot(get_request("/health"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"ok");
    }
}
