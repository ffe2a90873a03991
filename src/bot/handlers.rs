use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap},
};
use tracing::{debug, info, instrument, warn};

use super::{
    client::fire_and_forget,
    commands::{
        format_leaderboard, play_url, start_text, BotCommand, LEADERBOARD_TITLE,
        NO_SCORES_TEXT, PLAY_BUTTON_TEXT,
    },
    types::{Message, OutgoingMessage, Update},
};
use crate::scores::CHAT_LEADERBOARD_SIZE;
use crate::shared::{AppError, AppState};

/// HTTP handler for bot platform updates
///
/// POST /webhook/:key
/// Answers "OK" for every update once the key matches, including ones it ignores
#[instrument(name = "bot_webhook", skip(state, key, headers, body))]
pub async fn bot_webhook(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, AppError> {
    if !key_matches(key.as_bytes(), state.config.webhook_key.as_bytes()) {
        warn!("Webhook called with wrong key");
        return Err(AppError::NotFound("Not found".to_string()));
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!(error = %e, "Ignoring unparseable update");
            return Ok("OK");
        }
    };

    let Some(message) = update.message else {
        debug!(update_id = update.update_id, "Ignoring update without message");
        return Ok("OK");
    };

    let Some(text) = message.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
        debug!(update_id = update.update_id, "Ignoring message without text");
        return Ok("OK");
    };

    let reply = build_reply(&state, &message, text, &headers).await?;

    info!(
        chat_id = message.chat.id,
        command = ?BotCommand::parse(text),
        "Replying to chat command"
    );
    fire_and_forget(
        "sendMessage",
        state.config.bot_timeout,
        state.bot.send_message(reply),
    )
    .await;

    Ok("OK")
}

async fn build_reply(
    state: &AppState,
    message: &Message,
    text: &str,
    headers: &HeaderMap,
) -> Result<OutgoingMessage, AppError> {
    let chat_id = message.chat.id.to_string();

    let reply = match BotCommand::parse(text) {
        Some(BotCommand::Start) => {
            let player = message.sender_id();
            let best = state
                .score_repository
                .get(&player.to_string())
                .await?
                .map(|record| record.best_score);

            let api_base = api_base(state, headers);
            let url = play_url(&state.config.game_url, player, &api_base);
            OutgoingMessage::text(chat_id, start_text(best)).with_url_button(PLAY_BUTTON_TEXT, url)
        }
        Some(BotCommand::Leaderboard) => {
            let rows = state
                .score_repository
                .top_n(CHAT_LEADERBOARD_SIZE)
                .await?;
            let text = if rows.is_empty() {
                NO_SCORES_TEXT.to_string()
            } else {
                format_leaderboard(LEADERBOARD_TITLE, &rows)
            };
            OutgoingMessage::text(chat_id, text)
        }
        None => OutgoingMessage::text(chat_id, BotCommand::help_text()),
    };

    Ok(reply)
}

/// Compares without exiting early on the first differing byte
fn key_matches(given: &[u8], expected: &[u8]) -> bool {
    if given.len() != expected.len() {
        return false;
    }
    given
        .iter()
        .zip(expected)
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

/// Base URL the game should call back, from config or the request's own host
fn api_base(state: &AppState, headers: &HeaderMap) -> String {
    if let Some(url) = &state.config.public_url {
        return url.clone();
    }

    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");

    headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(|host| format!("{}://{}", scheme, host.trim_end_matches('/')))
        .unwrap_or_default()
}
