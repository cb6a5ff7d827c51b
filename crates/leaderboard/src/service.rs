//! Leaderboard service.

use std::sync::Arc;
use tracing::{info, warn};
use vault_core::{LeaderboardSnapshot, LevelId, NewScore, ScoreEntry};
use vault_storage::{ScoreQuery, ScoreStore, StoreError};

use crate::ranking::rank;

/// Number of runs shown on a level's leaderboard.
pub const DEFAULT_LIMIT: usize = 10;

/// A completed run could not be recorded.
#[derive(Debug, thiserror::Error)]
#[error("failed to submit time for level {level_id}: {source}")]
pub struct SubmitError {
    /// Level the run belonged to
    pub level_id: LevelId,
    /// Underlying store failure
    #[source]
    pub source: StoreError,
}

/// A leaderboard could not be read.
#[derive(Debug, thiserror::Error)]
#[error("failed to load leaderboard for level {level_id}: {source}")]
pub struct FetchError {
    /// Level that was queried
    pub level_id: LevelId,
    /// Underlying store failure
    #[source]
    pub source: StoreError,
}

/// Submits completed runs and reads ranked snapshots.
pub struct LeaderboardService<S: ScoreStore> {
    store: Arc<S>,
}

impl<S: ScoreStore> Clone for LeaderboardService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: ScoreStore> LeaderboardService<S> {
    /// Create a service over a store.
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Create a service over a shared store.
    pub fn from_shared(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Access the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Record one completed run.
    ///
    /// Every call appends a row, even when the player already has a faster
    /// time on this level.
    pub async fn submit(
        &self,
        player_name: &str,
        level_id: LevelId,
        completion_time: u32,
    ) -> Result<ScoreEntry, SubmitError> {
        let score = NewScore::new(player_name, level_id, completion_time);

        match self.store.insert_score(&score).await {
            Ok(entry) => {
                info!(
                    "Recorded {}s for {} on level {}",
                    entry.completion_time, entry.player_name, level_id
                );
                Ok(entry)
            }
            Err(source) => {
                warn!("Score submission for level {} failed: {}", level_id, source);
                Err(SubmitError { level_id, source })
            }
        }
    }

    /// Read the fastest `limit` runs for a level.
    pub async fn fetch_top(
        &self,
        level_id: LevelId,
        limit: usize,
    ) -> Result<LeaderboardSnapshot, FetchError> {
        if limit == 0 {
            return Ok(LeaderboardSnapshot::empty(level_id));
        }

        let rows = self
            .store
            .top_scores(&ScoreQuery::top(level_id, limit))
            .await
            .map_err(|source| {
                warn!("Leaderboard read for level {} failed: {}", level_id, source);
                FetchError { level_id, source }
            })?;

        // Rows from other levels never belong in the snapshot, whatever the backend returned.
        let rows = rows.into_iter().filter(|r| r.level_id == level_id).collect();

        Ok(LeaderboardSnapshot {
            level_id,
            entries: rank(rows, limit),
            taken_at: chrono::Utc::now(),
        })
    }

    /// Read the standard top-ten for a level.
    pub async fn fetch_top_default(&self, level_id: LevelId) -> Result<LeaderboardSnapshot, FetchError> {
        self.fetch_top(level_id, DEFAULT_LIMIT).await
    }
}
