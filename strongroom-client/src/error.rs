//! Client error types.

use crate::transport::TransportError;
use strongroom_crypto::CryptoError;
use thiserror::Error;

/// Result type for client security operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by the credential manager and request authorizer.
///
/// `Clone` so a single refresh failure can be handed to every caller that
/// was waiting on the same exchange.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("no refresh token available, re-authentication required")]
    NoRefreshToken,

    #[error("token refresh failed: {0}")]
    RefreshExchangeFailed(#[from] TransportError),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("invalid header value: {0}")]
    InvalidHeader(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// True for failures the caller should answer with a re-login prompt.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(
            self,
            ClientError::NoRefreshToken | ClientError::RefreshExchangeFailed(_)
        )
    }
}
