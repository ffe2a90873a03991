use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::Row;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::models::ScoreRecord;
use crate::shared::AppError;

/// Trait for score store operations
#[async_trait]
pub trait ScoreRepository {
    /// Atomically raises the stored best for `user_id` to at least `score`,
    /// creating the record if needed, and returns the resulting best
    async fn upsert_best(
        &self,
        user_id: &str,
        score: i64,
        now: DateTime<Utc>,
    ) -> Result<i64, AppError>;

    /// Up to `n` records, best score descending, earlier `updated_at` first on ties
    async fn top_n(&self, n: usize) -> Result<Vec<ScoreRecord>, AppError>;

    async fn get(&self, user_id: &str) -> Result<Option<ScoreRecord>, AppError>;

    /// Deletes every record, returning how many were removed
    async fn clear_all(&self) -> Result<u64, AppError>;

    /// Claims the weekly reset for `window_start` and clears every record in one step.
    ///
    /// Returns the number of records removed, or `None` if the window was already claimed.
    /// On error neither the claim nor the clear is kept, so a later call can retry.
    async fn reset_window(
        &self,
        window_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Option<u64>, AppError>;
}

/// In-memory implementation of ScoreRepository for development and testing
///
/// Data is lost when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryScoreRepository {
    scores: Mutex<HashMap<String, ScoreRecord>>,
    resets: Mutex<HashSet<DateTime<Utc>>>,
}

impl InMemoryScoreRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an in-memory repository with pre-populated records
    pub fn with_records(records: Vec<ScoreRecord>) -> Self {
        let scores = records
            .into_iter()
            .map(|record| (record.user_id.clone(), record))
            .collect();

        Self {
            scores: Mutex::new(scores),
            resets: Mutex::new(HashSet::new()),
        }
    }
}

#[async_trait]
impl ScoreRepository for InMemoryScoreRepository {
    #[instrument(skip(self))]
    async fn upsert_best(
        &self,
        user_id: &str,
        score: i64,
        now: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        // Lock is held across read-modify-write
        let mut scores = self.scores.lock().await;
        let record = scores
            .entry(user_id.to_string())
            .and_modify(|record| {
                record.best_score = record.best_score.max(score);
                record.updated_at = now;
            })
            .or_insert_with(|| ScoreRecord::new(user_id.to_string(), score, now));

        debug!(user_id = %user_id, best = record.best_score, "Best score stored in memory");
        Ok(record.best_score)
    }

    #[instrument(skip(self))]
    async fn top_n(&self, n: usize) -> Result<Vec<ScoreRecord>, AppError> {
        let scores = self.scores.lock().await;
        let mut records: Vec<ScoreRecord> = scores.values().cloned().collect();
        records.sort_by(ScoreRecord::rank_cmp);
        records.truncate(n);
        Ok(records)
    }

    #[instrument(skip(self))]
    async fn get(&self, user_id: &str) -> Result<Option<ScoreRecord>, AppError> {
        Ok(self.scores.lock().await.get(user_id).cloned())
    }

    #[instrument(skip(self))]
    async fn clear_all(&self) -> Result<u64, AppError> {
        let mut scores = self.scores.lock().await;
        let removed = scores.len() as u64;
        scores.clear();

        debug!(removed = removed, "Cleared all scores in memory");
        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn reset_window(
        &self,
        window_start: DateTime<Utc>,
        _now: DateTime<Utc>,
    ) -> Result<Option<u64>, AppError> {
        // Both locks are held so the claim and the clear are seen together
        let mut resets = self.resets.lock().await;
        let mut scores = self.scores.lock().await;
        if !resets.insert(window_start) {
            return Ok(None);
        }

        let removed = scores.len() as u64;
        scores.clear();

        debug!(removed = removed, "Weekly window claimed and scores cleared in memory");
        Ok(Some(removed))
    }
}

/// SQLite implementation of the score store
///
/// One pool is opened at startup and shared by every handler and the reset task.
pub struct SqliteScoreRepository {
    pool: SqlitePool,
}

impl SqliteScoreRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if missing) the database at `database_url` and ensures the schema
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(db_error)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(db_error)?;

        let repository = Self::new(pool);
        repository.init_schema().await?;

        info!(database_url = %database_url, "Score store ready");
        Ok(repository)
    }

    /// Private in-memory database on a single pinned connection
    pub async fn in_memory() -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(db_error)?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(db_error)?;

        let repository = Self::new(pool);
        repository.init_schema().await?;
        Ok(repository)
    }

    async fn init_schema(&self) -> Result<(), AppError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS scores (
                user_id TEXT PRIMARY KEY,
                best_score INTEGER NOT NULL DEFAULT 0,
                updated_at INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS weekly_resets (
                window_start INTEGER PRIMARY KEY,
                reset_at INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }
}

fn db_error(error: sqlx::Error) -> AppError {
    warn!(error = %error, "Score store operation failed");
    AppError::DatabaseError(error.to_string())
}

fn record_from_row(row: &SqliteRow) -> Result<ScoreRecord, AppError> {
    let updated_at_ms: i64 = row.try_get("updated_at").map_err(db_error)?;
    let updated_at = DateTime::from_timestamp_millis(updated_at_ms).ok_or_else(|| {
        AppError::DatabaseError(format!("invalid updated_at {}", updated_at_ms))
    })?;

    Ok(ScoreRecord {
        user_id: row.try_get("user_id").map_err(db_error)?,
        best_score: row.try_get("best_score").map_err(db_error)?,
        updated_at,
    })
}

#[async_trait]
impl ScoreRepository for SqliteScoreRepository {
    #[instrument(skip(self))]
    async fn upsert_best(
        &self,
        user_id: &str,
        score: i64,
        now: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        // Single statement, so concurrent submissions for one player cannot lose an update
        let row = sqlx::query(
            "INSERT INTO scores (user_id, best_score, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET
                 best_score = MAX(scores.best_score, excluded.best_score),
                 updated_at = excluded.updated_at
             RETURNING best_score",
        )
        .bind(user_id)
        .bind(score)
        .bind(now.timestamp_millis())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        let best: i64 = row.try_get("best_score").map_err(db_error)?;
        debug!(user_id = %user_id, best = best, "Best score stored in database");
        Ok(best)
    }

    #[instrument(skip(self))]
    async fn top_n(&self, n: usize) -> Result<Vec<ScoreRecord>, AppError> {
        let rows = sqlx::query(
            "SELECT user_id, best_score, updated_at FROM scores
             ORDER BY best_score DESC, updated_at ASC
             LIMIT ?1",
        )
        .bind(n as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(record_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn get(&self, user_id: &str) -> Result<Option<ScoreRecord>, AppError> {
        let row = sqlx::query(
            "SELECT user_id, best_score, updated_at FROM scores WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.as_ref().map(record_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn clear_all(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM scores")
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        debug!(removed = result.rows_affected(), "Cleared all scores in database");
        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn reset_window(
        &self,
        window_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Option<u64>, AppError> {
        // Dropping the transaction without commit rolls the claim back
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let claimed =
            sqlx::query("INSERT OR IGNORE INTO weekly_resets (window_start, reset_at) VALUES (?1, ?2)")
                .bind(window_start.timestamp_millis())
                .bind(now.timestamp_millis())
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;

        if claimed.rows_affected() == 0 {
            return Ok(None);
        }

        let cleared = sqlx::query("DELETE FROM scores")
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;

        debug!(
            removed = cleared.rows_affected(),
            "Weekly window claimed and scores cleared in database"
        );
        Ok(Some(cleared.rows_affected()))
    }
}
