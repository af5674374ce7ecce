//! Crypto error types.

use thiserror::Error;

/// Result type for cipher operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors raised by the payload cipher.
///
/// The request signer never fails and has no variants here.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("unsupported envelope version: {0}")]
    UnsupportedVersion(String),

    #[error("unsupported envelope algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// The envelope authenticated but its plaintext is not UTF-8 text.
    #[error("decrypted content is not valid UTF-8: {0}")]
    InvalidUtf8(String),
}
