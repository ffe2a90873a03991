use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

use super::{
    repository::ScoreRepository,
    types::{LeaderboardEntry, ValidSubmission},
};
use crate::bot::{fire_and_forget, BotApi};
use crate::shared::AppError;

/// Service for score submission and leaderboard reads
pub struct ScoreService {
    repository: Arc<dyn ScoreRepository + Send + Sync>,
    bot: Arc<dyn BotApi + Send + Sync>,
    bot_timeout: Duration,
}

impl ScoreService {
    pub fn new(
        repository: Arc<dyn ScoreRepository + Send + Sync>,
        bot: Arc<dyn BotApi + Send + Sync>,
        bot_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            bot,
            bot_timeout,
        }
    }

    /// Stores the submission and mirrors the resulting best to the bot platform
    #[instrument(skip(self))]
    pub async fn submit(&self, submission: ValidSubmission) -> Result<i64, AppError> {
        let best = self
            .repository
            .upsert_best(&submission.user_id, submission.score, Utc::now())
            .await?;

        info!(
            user_id = %submission.user_id,
            score = submission.score,
            best = best,
            "Score recorded"
        );

        match submission.user_id.parse::<i64>() {
            Ok(numeric_id) => {
                fire_and_forget(
                    "setGameScore",
                    self.bot_timeout,
                    self.bot.set_game_score(numeric_id, best),
                )
                .await;
            }
            Err(_) => {
                debug!(user_id = %submission.user_id, "Non-numeric user id, skipping score mirror");
            }
        }

        Ok(best)
    }

    /// Top `limit` players in leaderboard order
    #[instrument(skip(self))]
    pub async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, AppError> {
        let rows = self.repository.top_n(limit).await?;

        Ok(rows
            .into_iter()
            .map(|row| LeaderboardEntry {
                user_id: row.user_id,
                best: row.best_score,
            })
            .collect())
    }
}
