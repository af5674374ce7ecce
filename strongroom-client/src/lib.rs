//! Client security core for the Strongroom API client.
//!
//! Provides:
//! - Credential lifecycle management with fail-closed expiry checks
//! - Deduplicated access token refresh (one exchange per burst of callers)
//! - Per-request bearer and HMAC signature headers
//! - Re-exports of the payload cipher and request signer from
//!   `strongroom-crypto`
//!
//! The resource wrappers (vaults, documents, teams, ...) live elsewhere and
//! call into this crate for a valid token, optional signatures, and
//! client-side encryption of document content.

pub mod config;
pub mod credentials;
pub mod error;
pub mod session;
pub mod token;
pub mod transport;

pub use config::ClientConfig;
pub use credentials::{
    CredentialManager, CredentialPair, CredentialState, RefreshObserver, RefreshedSession,
    REFRESH_TOKEN_HEADER,
};
pub use error::{ClientError, ClientResult};
pub use session::RequestAuthorizer;
pub use token::{decode_claims, is_expired, ClaimsState, TokenClaims};
pub use transport::{HttpTransport, RefreshTransport, TransportError, TransportResult};

pub use strongroom_crypto as crypto;
