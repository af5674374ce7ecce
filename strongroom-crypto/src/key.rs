//! Content keys for the payload cipher.

use crate::error::{CryptoError, CryptoResult};
use rand::RngCore;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// AES-256 key size in bytes.
pub const KEY_SIZE: usize = 32;

/// AES-GCM IV size in bytes.
pub const IV_SIZE: usize = 12;

/// AES-GCM authentication tag size in bytes.
pub const TAG_SIZE: usize = 16;

/// A 256-bit content key, zeroized when dropped.
///
/// Callers hold keys as 64-character hex strings; this type is the decoded
/// form used for the duration of one cipher call.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ContentKey([u8; KEY_SIZE]);

impl ContentKey {
    /// Generates a fresh random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Parses a hex-encoded key.
    ///
    /// Anything that does not decode to exactly 32 bytes is rejected with
    /// `InvalidKeyLength`. Input that is not hex at all reports an actual
    /// length of 0.
    pub fn from_hex(key_hex: &str) -> CryptoResult<Self> {
        let mut decoded = hex::decode(key_hex).unwrap_or_default();
        if decoded.len() != KEY_SIZE {
            let actual = decoded.len();
            decoded.zeroize();
            return Err(CryptoError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual,
            });
        }

        let mut bytes = [0u8; KEY_SIZE];
        bytes.copy_from_slice(&decoded);
        decoded.zeroize();
        Ok(Self(bytes))
    }

    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Returns the lowercase hex form handed to callers.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ContentKey([REDACTED])")
    }
}

/// Generates a new random content key as 64 lowercase hex characters.
pub fn generate_key() -> String {
    ContentKey::generate().to_hex()
}
