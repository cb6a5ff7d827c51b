//! Store selection settings.

use std::path::PathBuf;
use tracing::info;

use super::{JsonStore, MemoryStore, RestConfig, RestStore, Result, ScoreStore};

/// Which backend holds the leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreKind {
    /// Process-local table, lost on exit
    Memory,
    /// JSON file under the data directory
    #[default]
    Json,
    /// Hosted PostgREST table
    Rest,
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreKind::Memory => write!(f, "memory"),
            StoreKind::Json => write!(f, "json"),
            StoreKind::Rest => write!(f, "rest"),
        }
    }
}

/// Everything needed to open a score store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Backend kind
    pub kind: StoreKind,

    /// Directory used by the JSON backend
    pub data_dir: PathBuf,

    /// Settings for the REST backend
    pub rest: RestConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::default(),
            data_dir: PathBuf::from(".vault"),
            rest: RestConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Open the configured backend.
    pub async fn open(&self) -> Result<Box<dyn ScoreStore>> {
        info!("Opening {} score store", self.kind);
        let store: Box<dyn ScoreStore> = match self.kind {
            StoreKind::Memory => Box::new(MemoryStore::new()),
            StoreKind::Json => Box::new(JsonStore::new(&self.data_dir).await?),
            StoreKind::Rest => Box::new(RestStore::new(self.rest.clone())?),
        };
        Ok(store)
    }
}
