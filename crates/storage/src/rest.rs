//! PostgREST client for a hosted leaderboard table.
//!
//! Speaks the dialect exposed by Supabase-style backends: rows are inserted
//! with `POST /rest/v1/<table>` and read with filter/order/limit query
//! parameters on `GET /rest/v1/<table>`.

use std::time::Duration;
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, RequestBuilder};
use tracing::{debug, warn};
use vault_core::{NewScore, ScoreEntry};

use super::{Result, ScoreQuery, ScoreStore, StoreError, LEADERBOARD_TABLE};

/// Columns read back from the table.
const SELECT_COLUMNS: &str = "id,player_name,level_id,completion_time,completed_at";

/// Ordering used by every leaderboard read.
const RANK_ORDER: &str = "completion_time.asc,completed_at.asc";

/// Connection settings for [`RestStore`].
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`
    pub url: String,

    /// Public API key, sent as `apikey` and bearer token
    pub api_key: String,

    /// Table name
    pub table: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            table: LEADERBOARD_TABLE.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Remote leaderboard store over HTTP.
#[derive(Clone)]
pub struct RestStore {
    /// HTTP client
    client: Client,

    /// Connection settings
    config: RestConfig,
}

impl RestStore {
    /// Create a client. Fails when the URL or key is missing.
    pub fn new(config: RestConfig) -> Result<Self> {
        if config.url.trim().is_empty() {
            return Err(StoreError::NotConfigured("remote store URL is empty".to_string()));
        }
        if config.api_key.trim().is_empty() {
            return Err(StoreError::NotConfigured("remote store API key is empty".to_string()));
        }

        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();

        Ok(Self { client, config })
    }

    /// Endpoint of the configured table.
    pub fn table_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.url.trim_end_matches('/'),
            self.config.table
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", self.config.api_key.as_str())
            .bearer_auth(&self.config.api_key)
    }
}

/// Query string for a leaderboard read.
pub fn top_query_params(query: &ScoreQuery) -> Vec<(&'static str, String)> {
    vec![
        ("select", SELECT_COLUMNS.to_string()),
        ("level_id", format!("eq.{}", query.level_id)),
        ("order", RANK_ORDER.to_string()),
        ("limit", query.limit.to_string()),
    ]
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!("Remote store returned status {}: {}", status, body);
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl ScoreStore for RestStore {
    async fn insert_score(&self, score: &NewScore) -> Result<ScoreEntry> {
        debug!("Inserting score for level {} into {}", score.level_id, self.config.table);

        let response = self
            .authorized(self.client.post(self.table_url()))
            .header("Prefer", "return=representation")
            .json(score)
            .send()
            .await?;

        let rows: Vec<ScoreEntry> = ensure_success(response).await?.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Other("insert returned no row".to_string()))
    }

    async fn top_scores(&self, query: &ScoreQuery) -> Result<Vec<ScoreEntry>> {
        debug!("Fetching top {} for level {}", query.limit, query.level_id);

        let response = self
            .authorized(self.client.get(self.table_url()))
            .query(&top_query_params(query))
            .send()
            .await?;

        Ok(ensure_success(response).await?.json().await?)
    }

    async fn health_check(&self) -> bool {
        let request = self
            .authorized(self.client.get(self.table_url()))
            .query(&[("select", "id"), ("limit", "1")]);
        match request.send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!("Remote store unreachable: {}", e);
                false
            }
        }
    }
}
