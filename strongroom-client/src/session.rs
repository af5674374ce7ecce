//! Per-request header decoration.
//!
//! [`RequestAuthorizer`] is the one call the resource layer makes before
//! each outbound request: it produces the bearer header (refreshing first if
//! the token is stale) and, when signing is configured, the three signature
//! headers.

use crate::config::ClientConfig;
use crate::credentials::CredentialManager;
use crate::error::{ClientError, ClientResult};
use crate::transport::RefreshTransport;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use std::sync::Arc;
use strongroom_crypto::signing;

/// Builds auth and signature headers for outbound API requests.
pub struct RequestAuthorizer {
    manager: CredentialManager,
    transport: Arc<dyn RefreshTransport>,
    signing_secret: Option<Vec<u8>>,
}

impl RequestAuthorizer {
    /// Creates an authorizer that attaches bearer tokens only.
    pub fn new(manager: CredentialManager, transport: Arc<dyn RefreshTransport>) -> Self {
        Self {
            manager,
            transport,
            signing_secret: None,
        }
    }

    /// Enables request signing with the given secret (typically an API key).
    pub fn with_signing_secret(mut self, secret: impl Into<Vec<u8>>) -> Self {
        self.signing_secret = Some(secret.into());
        self
    }

    /// Creates an authorizer honouring `config.signing_enabled`.
    ///
    /// Signing enabled without a secret is a configuration error; a secret
    /// supplied while signing is disabled is ignored.
    pub fn from_config(
        config: &ClientConfig,
        manager: CredentialManager,
        transport: Arc<dyn RefreshTransport>,
        signing_secret: Option<Vec<u8>>,
    ) -> ClientResult<Self> {
        config.validate()?;
        let authorizer = Self::new(manager, transport);
        match (config.signing_enabled, signing_secret) {
            (true, Some(secret)) if !secret.is_empty() => {
                Ok(authorizer.with_signing_secret(secret))
            }
            (true, _) => Err(ClientError::Config(
                "signing_enabled requires a signing secret".to_string(),
            )),
            (false, _) => Ok(authorizer),
        }
    }

    pub fn manager(&self) -> &CredentialManager {
        &self.manager
    }

    pub fn is_signing(&self) -> bool {
        self.signing_secret.is_some()
    }

    /// Returns the headers to attach to a request for `method` and `path`.
    ///
    /// `body` is the exact byte sequence that will be sent; it is hashed into
    /// the signature and never copied into a header.
    pub async fn authorize(
        &self,
        method: &str,
        path: &str,
        body: &[u8],
    ) -> ClientResult<HeaderMap> {
        let token = self
            .manager
            .valid_access_token(Arc::clone(&self.transport))
            .await?;

        let mut headers = HeaderMap::new();
        let mut bearer = header_value(&format!("Bearer {token}"))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        if let Some(secret) = &self.signing_secret {
            let signed = signing::sign_request(secret, method, path, body);
            for (name, value) in signed.header_pairs() {
                headers.insert(HeaderName::from_static(name), header_value(value)?);
            }
        }

        Ok(headers)
    }
}

fn header_value(value: &str) -> ClientResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| ClientError::InvalidHeader(e.to_string()))
}
