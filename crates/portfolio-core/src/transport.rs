//! Portfolio backend integration

use crate::config::ApiConfig;
use crate::error::{Error, Result, TransportError};
use crate::types::RepositoryRecord;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Source of the repository list.
///
/// Implementations report timeouts and connectivity failures as
/// [`TransportError::Timeout`] / [`TransportError::Io`] so the orchestrator
/// can retry them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RepositoryTransport: Send + Sync {
    /// Fetch the full repository list
    async fn fetch_repository_list(
        &self,
    ) -> std::result::Result<Vec<RepositoryRecord>, TransportError>;
}

/// HTTP client for the portfolio backend
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a client for `base_url` with a per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("portfolio-core/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Create a client from the `[api]` config section
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    /// Endpoint serving the repository list
    pub fn repositories_url(&self) -> String {
        format!("{}/repositories", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl RepositoryTransport for HttpTransport {
    async fn fetch_repository_list(
        &self,
    ) -> std::result::Result<Vec<RepositoryRecord>, TransportError> {
        let url = self.repositories_url();
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Other(format!(
                "backend returned HTTP {}",
                status
            )));
        }

        // A body cut short is a connectivity failure, only a complete body can be malformed
        let body = response.bytes().await.map_err(|e| match TransportError::from(e) {
            TransportError::Other(msg) => TransportError::Io(msg),
            retryable => retryable,
        })?;
        let repos: Vec<RepositoryRecord> = serde_json::from_slice(&body)
            .map_err(|e| TransportError::Other(format!("invalid repository list: {}", e)))?;
        debug!("Received {} repositories", repos.len());
        Ok(repos)
    }
}
