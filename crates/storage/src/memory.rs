//! In-memory score table.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;
use vault_core::{NewScore, ScoreEntry, ScoreId};

use super::{Result, ScoreQuery, ScoreStore};

/// Process-local leaderboard table. Used for offline play and tests.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<ScoreEntry>>,
}

impl MemoryStore {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table pre-populated with rows.
    pub fn with_rows(rows: Vec<ScoreEntry>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }

    /// Copy of every stored row in insertion order.
    pub async fn rows(&self) -> Vec<ScoreEntry> {
        self.rows.lock().await.clone()
    }

    /// Number of stored rows.
    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    /// Whether the table is empty.
    pub async fn is_empty(&self) -> bool {
        self.rows.lock().await.is_empty()
    }
}

#[async_trait]
impl ScoreStore for MemoryStore {
    async fn insert_score(&self, score: &NewScore) -> Result<ScoreEntry> {
        let entry = ScoreEntry::from_new(ScoreId::generate(), score.clone(), chrono::Utc::now());
        let mut rows = self.rows.lock().await;
        rows.push(entry.clone());
        debug!("Stored score {} in memory ({} rows)", entry.id, rows.len());
        Ok(entry)
    }

    async fn top_scores(&self, query: &ScoreQuery) -> Result<Vec<ScoreEntry>> {
        let rows = self.rows.lock().await;
        Ok(query.apply(rows.iter().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vault_core::LevelId;

    #[tokio::test]
    async fn test_insert_assigns_id_and_timestamp() {
        let store = MemoryStore::new();
        let before = chrono::Utc::now();

        let entry = store
            .insert_score(&NewScore::new("Ann", LevelId::FIRST, 12))
            .await
            .unwrap();

        assert_eq!(entry.player_name, "Ann");
        assert!(entry.completed_at >= before);
        assert!(!entry.id.as_str().is_empty());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_every_submission_is_kept() {
        let store = MemoryStore::new();
        for time in [30, 40, 20] {
            store
                .insert_score(&NewScore::new("Ann", LevelId::FIRST, time))
                .await
                .unwrap();
        }

        let top = store
            .top_scores(&ScoreQuery::top(LevelId::FIRST, 10))
            .await
            .unwrap();
        let times: Vec<_> = top.iter().map(|e| e.completion_time).collect();
        assert_eq!(times, vec![20, 30, 40]);
    }
}
