use chrono::{DateTime, Utc};

/// Database model for the scores table, one row per player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRecord {
    pub user_id: String,
    pub best_score: i64,
    pub updated_at: DateTime<Utc>, // Last submission for this player, improving or not
}

impl ScoreRecord {
    pub fn new(user_id: String, best_score: i64, updated_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            best_score,
            updated_at,
        }
    }

    /// Leaderboard order: higher best first, earlier update first on ties
    pub fn rank_cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .best_score
            .cmp(&self.best_score)
            .then_with(|| self.updated_at.cmp(&other.updated_at))
    }
}
