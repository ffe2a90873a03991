use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use score_relay::{BotApi, BotError, OutgoingMessage};

// ============================================================================
// Mock Infrastructure
// ============================================================================

#[derive(Clone, Default)]
pub struct MockBot {
    sent_messages: Arc<RwLock<Vec<OutgoingMessage>>>,
    game_scores: Arc<RwLock<Vec<(i64, i64)>>>,
    unavailable: bool,
}

impl MockBot {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bot platform that rejects every call
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub async fn messages_for(&self, chat_id: &str) -> Vec<OutgoingMessage> {
        self.sent_messages
            .read()
            .await
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect()
    }

    pub async fn game_scores(&self) -> Vec<(i64, i64)> {
        self.game_scores.read().await.clone()
    }

    fn result(&self) -> Result<(), BotError> {
        if self.unavailable {
            Err(BotError::Api {
                description: "Too Many Requests".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BotApi for MockBot {
    async fn send_message(&self, message: OutgoingMessage) -> Result<(), BotError> {
        self.sent_messages.write().await.push(message);
        self.result()
    }

    async fn set_game_score(&self, user_id: i64, score: i64) -> Result<(), BotError> {
        self.game_scores.write().await.push((user_id, score));
        self.result()
    }
}
