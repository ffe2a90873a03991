use std::str::FromStr;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::scores::ScoreRecord;

pub const START_TEXT: &str = "Collect points, avoid obstacles. Scores auto-save.";
pub const PLAY_BUTTON_TEXT: &str = "▶️ Play";
pub const LEADERBOARD_TITLE: &str = "🏆 Top Players";
pub const NO_SCORES_TEXT: &str = "No scores yet.";

/// Chat commands understood by the webhook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
pub enum BotCommand {
    #[strum(to_string = "/start")]
    Start,
    #[strum(to_string = "/leaderboard")]
    Leaderboard,
}

impl BotCommand {
    /// Parses the first word of a chat message, dropping any `@botname` suffix
    pub fn parse(text: &str) -> Option<Self> {
        let first = text.split_whitespace().next()?;
        let command = first.split('@').next().unwrap_or(first);
        Self::from_str(command).ok()
    }

    /// Reply for text that is not a known command
    pub fn help_text() -> String {
        let commands: Vec<String> = Self::iter().map(|c| c.to_string()).collect();
        format!("Commands: {}", commands.join(", "))
    }
}

/// Greeting for `/start`, with the player's current best when they have one
pub fn start_text(best: Option<i64>) -> String {
    match best {
        Some(best) => format!("{}\n\nYour best this week: {}", START_TEXT, best),
        None => START_TEXT.to_string(),
    }
}

/// Renders ranked rows as a numbered chat message under `title`
pub fn format_leaderboard(title: &str, rows: &[ScoreRecord]) -> String {
    let mut lines = vec![title.to_string()];
    lines.extend(
        rows.iter()
            .enumerate()
            .map(|(i, row)| format!("{}. {} - {}", i + 1, row.user_id, row.best_score)),
    );
    lines.join("\n")
}

/// Game link carrying the player id and the API base the game should post scores to
pub fn play_url(game_url: &str, user_id: i64, api_base: &str) -> String {
    match reqwest::Url::parse(game_url) {
        Ok(mut url) => {
            url.query_pairs_mut()
                .append_pair("uid", &user_id.to_string())
                .append_pair("api", api_base);
            url.to_string()
        }
        Err(_) => format!("{}?uid={}&api={}", game_url, user_id, api_base),
    }
}
