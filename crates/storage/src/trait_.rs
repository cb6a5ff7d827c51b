//! Score store trait abstraction.

use async_trait::async_trait;
use vault_core::{LevelId, NewScore, ScoreEntry};

/// Name of the remote table holding completed runs.
pub const LEADERBOARD_TABLE: &str = "leaderboard";

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport error talking to a remote store
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote store answered with a non-success status
    #[error("store returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, as far as it could be read
        body: String,
    },

    /// The backend is missing required settings
    #[error("store not configured: {0}")]
    NotConfigured(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Read contract of the leaderboard table: rows for one level, ordered by
/// `completion_time` then `completed_at` (both ascending), at most `limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreQuery {
    /// Level filter (`level_id = X`)
    pub level_id: LevelId,

    /// Maximum rows returned
    pub limit: usize,
}

impl ScoreQuery {
    /// Query the fastest `limit` runs for a level.
    pub fn top(level_id: LevelId, limit: usize) -> Self {
        Self { level_id, limit }
    }

    /// Apply the query to an unordered set of rows, as a table scan would.
    pub fn apply(&self, rows: impl IntoIterator<Item = ScoreEntry>) -> Vec<ScoreEntry> {
        let mut matching: Vec<ScoreEntry> = rows
            .into_iter()
            .filter(|row| row.level_id == self.level_id)
            .collect();
        matching.sort_by_key(|row| (row.completion_time, row.completed_at));
        matching.truncate(self.limit);
        matching
    }
}

/// Storage abstraction for the leaderboard table.
///
/// Rows are append-only: the store assigns `id` and `completed_at` on
/// insert and nothing in VAULT updates or deletes them.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Append one completed run and return the stored row.
    async fn insert_score(&self, score: &NewScore) -> Result<ScoreEntry>;

    /// Read rows matching the query, already ordered and limited.
    async fn top_scores(&self, query: &ScoreQuery) -> Result<Vec<ScoreEntry>>;

    /// Check whether the store is reachable.
    async fn health_check(&self) -> bool {
        true
    }
}

#[async_trait]
impl<T: ScoreStore + ?Sized> ScoreStore for Box<T> {
    async fn insert_score(&self, score: &NewScore) -> Result<ScoreEntry> {
        (**self).insert_score(score).await
    }

    async fn top_scores(&self, query: &ScoreQuery) -> Result<Vec<ScoreEntry>> {
        (**self).top_scores(query).await
    }

    async fn health_check(&self) -> bool {
        (**self).health_check().await
    }
}

#[async_trait]
impl<T: ScoreStore + ?Sized> ScoreStore for std::sync::Arc<T> {
    async fn insert_score(&self, score: &NewScore) -> Result<ScoreEntry> {
        (**self).insert_score(score).await
    }

    async fn top_scores(&self, query: &ScoreQuery) -> Result<Vec<ScoreEntry>> {
        (**self).top_scores(query).await
    }

    async fn health_check(&self) -> bool {
        (**self).health_check().await
    }
}
