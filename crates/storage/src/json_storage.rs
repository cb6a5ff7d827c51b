//! JSON file storage implementation.
//!
//! Keeps the whole leaderboard table as one pretty-printed JSON array in
//! `<root>/leaderboard.json`. Intended for offline play on one machine.

use std::path::{Path, PathBuf};
use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;
use vault_core::{NewScore, ScoreEntry, ScoreId};

use super::{Result, ScoreQuery, ScoreStore, LEADERBOARD_TABLE};

/// File-based JSON storage backend.
pub struct JsonStore {
    root: PathBuf,
    // Serializes read-modify-write cycles on the table file.
    lock: Mutex<()>,
}

impl JsonStore {
    /// Create storage rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;

        Ok(Self {
            root,
            lock: Mutex::new(()),
        })
    }

    /// Path of the table file.
    pub fn table_path(&self) -> PathBuf {
        self.root.join(format!("{}.json", LEADERBOARD_TABLE))
    }

    async fn read_rows(&self) -> Result<Vec<ScoreEntry>> {
        Ok(read_json(&self.table_path()).await?.unwrap_or_default())
    }
}

#[async_trait]
impl ScoreStore for JsonStore {
    async fn insert_score(&self, score: &NewScore) -> Result<ScoreEntry> {
        let _guard = self.lock.lock().await;

        let mut rows = self.read_rows().await?;
        let entry = ScoreEntry::from_new(ScoreId::generate(), score.clone(), chrono::Utc::now());
        rows.push(entry.clone());

        let json = serde_json::to_string_pretty(&rows)?;
        fs::write(self.table_path(), json.as_bytes()).await?;

        debug!("Stored score {} in {}", entry.id, self.table_path().display());
        Ok(entry)
    }

    async fn top_scores(&self, query: &ScoreQuery) -> Result<Vec<ScoreEntry>> {
        let _guard = self.lock.lock().await;
        Ok(query.apply(self.read_rows().await?))
    }

    async fn health_check(&self) -> bool {
        fs::metadata(&self.root).await.map(|m| m.is_dir()).unwrap_or(false)
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
