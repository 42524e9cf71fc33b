//! HTTP pool source.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::StatusCode;
use tracing::instrument;

use quizwall_core::error::PoolLoadError;
use quizwall_core::model::Pool;
use quizwall_core::parser::{parse_pool_json, pool_file_name};
use quizwall_core::traits::PoolSource;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Fetches `<base_url>/module-<id>-pool.json`, bypassing HTTP caches so
/// revised pools are picked up on the next attempt.
pub struct HttpPoolSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpPoolSource {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of the pool for `module_id`.
    pub fn pool_url(&self, module_id: &str) -> String {
        format!("{}/{}", self.base_url, pool_file_name(module_id))
    }
}

#[async_trait]
impl PoolSource for HttpPoolSource {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self))]
    async fn fetch_pool(&self, module_id: &str) -> Result<Pool, PoolLoadError> {
        let fetch_error = |message: String| PoolLoadError::Fetch {
            module_id: module_id.to_string(),
            message,
        };

        let url = self.pool_url(module_id);
        let response = self
            .client
            .get(&url)
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    fetch_error(format!("request timed out after {DEFAULT_TIMEOUT_SECS}s"))
                } else if e.is_connect() {
                    fetch_error(format!("pool server not reachable at {}", self.base_url))
                } else {
                    fetch_error(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(PoolLoadError::NotFound(module_id.to_string()));
        }
        if !status.is_success() {
            return Err(PoolLoadError::HttpStatus {
                module_id: module_id.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| fetch_error(format!("failed to read response: {e}")))?;

        let pool = parse_pool_json(&body, module_id)?;
        tracing::debug!(%url, questions = pool.len(), "pool fetched");
        Ok(pool)
    }
}
