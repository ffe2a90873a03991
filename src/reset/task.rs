use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, instrument, warn};

use crate::bot::{fire_and_forget, BotApi, OutgoingMessage};
use crate::bot::commands::format_leaderboard;
use crate::config::ResetConfig;
use crate::scores::repository::ScoreRepository;
use crate::shared::AppError;

/// Players named in the weekly announcement
pub const WEEKLY_WINNERS: usize = 5;

pub const WINNERS_TITLE: &str = "🏁 Weekly Winners";
pub const WINNERS_FOOTER: &str = "🎉 Congrats! Leaderboard reset for the new week 🚀";

/// What a single scheduler check did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetOutcome {
    /// Outside the weekly window
    NotDue,
    /// Inside the window, but this window was already handled
    AlreadyDone,
    Reset { cleared: u64, announced: bool },
}

/// Dependencies of the weekly reset
pub struct WeeklyReset {
    repository: Arc<dyn ScoreRepository + Send + Sync>,
    bot: Arc<dyn BotApi + Send + Sync>,
    config: ResetConfig,
    admin_chat_id: Option<String>,
    bot_timeout: Duration,
}

impl WeeklyReset {
    pub fn new(
        repository: Arc<dyn ScoreRepository + Send + Sync>,
        bot: Arc<dyn BotApi + Send + Sync>,
        config: ResetConfig,
        admin_chat_id: Option<String>,
        bot_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            bot,
            config,
            admin_chat_id,
            bot_timeout,
        }
    }

    /// Clears the leaderboard and announces the winners if `now` falls in an
    /// unhandled weekly window
    ///
    /// The announcement goes out only after the clear has been committed. A failed clear leaves
    /// the window unclaimed, so the next poll retries it.
    #[instrument(skip(self))]
    pub async fn reset_if_due(&self, now: DateTime<Utc>) -> Result<ResetOutcome, AppError> {
        let Some(window_start) = self.config.window.window_start(now) else {
            return Ok(ResetOutcome::NotDue);
        };

        let winners = self.repository.top_n(WEEKLY_WINNERS).await?;

        let Some(cleared) = self.repository.reset_window(window_start, now).await? else {
            return Ok(ResetOutcome::AlreadyDone);
        };

        let announced = match &self.admin_chat_id {
            Some(chat_id) if !winners.is_empty() => {
                let text = format!(
                    "{}\n\n{}",
                    format_leaderboard(WINNERS_TITLE, &winners),
                    WINNERS_FOOTER
                );
                fire_and_forget(
                    "sendMessage",
                    self.bot_timeout,
                    self.bot.send_message(OutgoingMessage::text(chat_id.clone(), text)),
                )
                .await
            }
            _ => false,
        };

        info!(
            window_start = %window_start,
            cleared = cleared,
            announced = announced,
            "Weekly reset completed"
        );
        Ok(ResetOutcome::Reset { cleared, announced })
    }
}

/// Starts the background task that checks for the weekly window every poll interval
#[instrument(skip(reset))]
pub async fn start_weekly_reset_task(reset: WeeklyReset) {
    info!(
        poll_interval_secs = reset.config.poll_interval.as_secs(),
        next_reset = ?reset.config.window.next_start(Utc::now()),
        "Starting weekly reset background task"
    );

    let mut poll = interval(reset.config.poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        poll.tick().await;

        match reset.reset_if_due(Utc::now()).await {
            Ok(ResetOutcome::Reset { .. }) => {
                info!(
                    next_reset = ?reset.config.window.next_start(Utc::now()),
                    "Leaderboard cleared for the new week"
                );
            }
            Ok(_) => {}
            Err(e) => {
                error!(error = %e, "Weekly reset check failed");
            }
        }
    }
}

/// Spawns the reset task onto the runtime
pub fn spawn_weekly_reset_task(reset: WeeklyReset) -> tokio::task::JoinHandle<()> {
    if reset.admin_chat_id.is_none() {
        warn!("ADMIN_CHAT_ID not set, weekly resets will not be announced");
    }
    tokio::spawn(start_weekly_reset_task(reset))
}
