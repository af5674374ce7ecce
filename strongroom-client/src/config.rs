//! Client security configuration.

use crate::error::{ClientError, ClientResult};
use serde::{Deserialize, Serialize};

/// Configuration for credential refresh and request decoration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL for the Strongroom API (e.g., "https://api.strongroom.io").
    pub api_base_url: String,

    /// Path of the refresh endpoint, relative to `api_base_url`.
    pub refresh_path: String,

    /// Lead time before `exp` at which an access token counts as stale.
    pub refresh_buffer_ms: i64,

    /// Timeout applied by the HTTP transport to each exchange.
    pub request_timeout_secs: u64,

    /// Whether outbound requests carry HMAC signature headers.
    pub signing_enabled: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.strongroom.io".to_string(),
            refresh_path: "auth/refresh".to_string(),
            refresh_buffer_ms: 60_000, // one minute before expiry
            request_timeout_secs: 30,
            signing_enabled: false,
        }
    }
}

impl ClientConfig {
    /// Rejects configurations the client cannot operate with.
    pub fn validate(&self) -> ClientResult<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(ClientError::Config("missing api_base_url".to_string()));
        }
        if self.refresh_path.trim().is_empty() {
            return Err(ClientError::Config("missing refresh_path".to_string()));
        }
        if self.refresh_buffer_ms < 0 {
            return Err(ClientError::Config(format!(
                "refresh_buffer_ms must not be negative (got {})",
                self.refresh_buffer_ms
            )));
        }
        Ok(())
    }

    /// Joins `api_base_url` and a relative path with exactly one slash.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
