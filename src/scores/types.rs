use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::LEADERBOARD_MAX;
use crate::shared::AppError;

pub const BAD_PARAMS: &str = "bad params";

/// Raw body of `POST /score`
///
/// Fields stay untyped so that numbers, numeric strings and missing values
/// are all accepted and coerced during validation.
#[derive(Debug, Default, Deserialize)]
pub struct ScoreSubmission {
    #[serde(default)]
    pub user_id: Value,
    #[serde(default)]
    pub score: Value,
}

/// A submission that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSubmission {
    pub user_id: String,
    pub score: i64,
}

impl ScoreSubmission {
    /// Parses a request body, treating anything that is not a JSON object as empty
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }

    pub fn validate(&self) -> Result<ValidSubmission, AppError> {
        let user_id = coerce_user_id(&self.user_id);
        let score = coerce_score(&self.score)
            .ok_or_else(|| AppError::InvalidParams(BAD_PARAMS.to_string()))?;

        if user_id.is_empty() || score < 0 {
            return Err(AppError::InvalidParams(BAD_PARAMS.to_string()));
        }

        Ok(ValidSubmission { user_id, score })
    }
}

fn coerce_user_id(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn coerce_score(value: &Value) -> Option<i64> {
    match value {
        Value::Null => Some(0),
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Response for a stored submission
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ScoreResponse {
    pub ok: bool,
    pub best: i64,
}

/// One leaderboard row as exposed over HTTP
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub best: i64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct LeaderboardResponse {
    pub ok: bool,
    pub top: Vec<LeaderboardEntry>,
}

/// Query string of `GET /leaderboard`
#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<String>,
}

impl LeaderboardQuery {
    /// Requested size clamped to `1..=LEADERBOARD_MAX`; anything unparseable means the maximum
    pub fn limit(&self) -> usize {
        self.limit
            .as_deref()
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .unwrap_or(LEADERBOARD_MAX)
            .clamp(1, LEADERBOARD_MAX)
    }
}
