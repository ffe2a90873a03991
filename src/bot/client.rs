use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use super::types::{ApiReply, OutgoingMessage};

#[derive(Debug, Error)]
pub enum BotError {
    #[error("bot transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("bot api rejected call: {description}")]
    Api { description: String },
}

/// Outbound calls to the bot platform
#[async_trait]
pub trait BotApi {
    async fn send_message(&self, message: OutgoingMessage) -> Result<(), BotError>;

    /// Mirrors a player's best score to the platform's game high-score table
    async fn set_game_score(&self, user_id: i64, score: i64) -> Result<(), BotError>;
}

/// Telegram Bot API client
pub struct TelegramBotApi {
    client: reqwest::Client,
    base_url: String,
}

impl TelegramBotApi {
    pub fn new(api_url: &str, token: &str, timeout: Duration) -> Result<Self, BotError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    // The endpoint embeds the token, so it is never logged
    async fn call<T>(&self, method: &str, payload: &T) -> Result<(), BotError>
    where
        T: Serialize + Sync,
    {
        let reply: ApiReply = self
            .client
            .post(self.endpoint(method))
            .json(payload)
            .send()
            .await?
            .json()
            .await?;

        if !reply.ok {
            return Err(BotError::Api {
                description: reply
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            });
        }

        debug!(method = method, "Bot api call succeeded");
        Ok(())
    }
}

#[async_trait]
impl BotApi for TelegramBotApi {
    #[instrument(skip(self, message), fields(chat_id = %message.chat_id))]
    async fn send_message(&self, message: OutgoingMessage) -> Result<(), BotError> {
        self.call("sendMessage", &message).await
    }

    #[instrument(skip(self))]
    async fn set_game_score(&self, user_id: i64, score: i64) -> Result<(), BotError> {
        self.call(
            "setGameScore",
            &json!({
                "user_id": user_id,
                "score": score,
                "force": true
            }),
        )
        .await
    }
}

/// Runs a best-effort bot call under `timeout`.
///
/// Failures and timeouts are logged and swallowed; the return value only says
/// whether the call went through.
pub async fn fire_and_forget<F>(call: &'static str, timeout: Duration, future: F) -> bool
where
    F: Future<Output = Result<(), BotError>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(Ok(())) => true,
        Ok(Err(error)) => {
            warn!(call = call, error = %error, "Bot call failed, ignoring");
            false
        }
        Err(_) => {
            warn!(
                call = call,
                timeout_ms = timeout.as_millis() as u64,
                "Bot call timed out, ignoring"
            );
            false
        }
    }
}
