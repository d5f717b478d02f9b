//! Web-search adapter: forwards queries to a Tavily-style search API over
//! a shared HTTP client with bounded timeouts.

pub mod handler;

pub use handler::SearchTool;

use crate::error::{ConnectorError, ConnectorResult};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use toolgate_core::config::{optional, optional_parse, require, ConfigResult, EnvSource};

pub const DEFAULT_ENDPOINT: &str = "https://api.tavily.com/search";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Configuration for the search backend, read once at startup
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub api_key: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl SearchConfig {
    pub const API_KEY_VAR: &'static str = "SEARCH_API_KEY";
    pub const ENDPOINT_VAR: &'static str = "SEARCH_API_URL";
    pub const TIMEOUT_VAR: &'static str = "SEARCH_TIMEOUT_SECS";

    pub fn from_env(env: &dyn EnvSource) -> ConfigResult<Self> {
        let api_key = require(env, Self::API_KEY_VAR)?;
        let endpoint =
            optional(env, Self::ENDPOINT_VAR).unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        url::Url::parse(&endpoint).map_err(|e| toolgate_core::ConfigError::Invalid {
            var: Self::ENDPOINT_VAR.to_string(),
            reason: e.to_string(),
        })?;
        let timeout = optional_parse::<u64>(env, Self::TIMEOUT_VAR)?
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        Ok(Self { api_key, endpoint, timeout })
    }
}

/// One search hit as returned to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct UpstreamResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

/// Owns the long-lived HTTP session to the search API.
///
/// One client per adapter; concurrent calls share its connection pool.
pub struct SearchClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl SearchClient {
    pub fn new(config: &SearchConfig) -> ConnectorResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConnectorError::Connection(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, endpoint: config.endpoint.clone(), api_key: config.api_key.clone() })
    }

    /// Forward a query upstream, translating transport failures into the
    /// connector taxonomy.
    pub async fn search(
        &self,
        query: &str,
        max_results: Option<i64>,
        cancel: &CancellationToken,
    ) -> ConnectorResult<Vec<SearchResult>> {
        let mut body = json!({ "api_key": self.api_key, "query": query });
        if let Some(n) = max_results {
            body["max_results"] = json!(n);
        }

        let started = Instant::now();
        let request = self.client.post(&self.endpoint).json(&body).send();

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(ConnectorError::Cancelled),
            res = request => res.map_err(|e| self.classify(e, started))?,
        };

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            let message = message.chars().take(256).collect::<String>();
            return Err(ConnectorError::UpstreamStatus { status: status.as_u16(), message });
        }

        let parsed: UpstreamResponse = tokio::select! {
            _ = cancel.cancelled() => return Err(ConnectorError::Cancelled),
            res = response.json() => res.map_err(|e| self.classify(e, started))?,
        };
        Ok(parsed.results)
    }

    fn classify(&self, err: reqwest::Error, started: Instant) -> ConnectorError {
        if err.is_timeout() {
            ConnectorError::Timeout(started.elapsed().as_millis() as u64)
        } else {
            ConnectorError::Http(err)
        }
    }
}
