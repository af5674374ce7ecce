//! Transport seam for the refresh exchange.
//!
//! The credential manager only ever needs "POST and parse JSON". The CRUD
//! layer supplies that capability; [`HttpTransport`] is the reqwest-backed
//! default. A transport must never add auth headers of its own, or a stale
//! access token would be sent to the refresh endpoint.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Result type for transport exchanges.
pub type TransportResult<T> = Result<T, TransportError>;

/// Failure of a single transport exchange.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Minimal outbound capability used by the refresh exchange.
#[async_trait]
pub trait RefreshTransport: Send + Sync {
    /// POSTs to `path` (relative to the API base) with the given headers and
    /// no body, returning the parsed JSON response.
    async fn post_json(&self, path: &str, headers: &[(&str, &str)]) -> TransportResult<Value>;
}

/// reqwest-backed [`RefreshTransport`].
pub struct HttpTransport {
    client: Client,
    config: ClientConfig,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Wraps an existing reqwest client, e.g. one shared with the CRUD layer.
    pub fn with_client(client: Client, config: ClientConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[async_trait]
impl RefreshTransport for HttpTransport {
    async fn post_json(&self, path: &str, headers: &[(&str, &str)]) -> TransportResult<Value> {
        let url = self.config.endpoint(path);
        let mut request = self.client.post(&url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "POST {path} rejected");
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<Value>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}
