//! HMAC-SHA256 request signing.
//!
//! The signed material is a fixed-order, newline-joined canonical payload:
//!
//! ```text
//! METHOD\nPATH\nTIMESTAMP\nNONCE\nBODYHASH
//! ```
//!
//! The body is represented only by its SHA-256 hash, so large or binary
//! bodies never end up in the signed string. The secret (typically an API
//! key) is used directly as the HMAC key.

use chrono::{DateTime, SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex HMAC-SHA256 signature.
pub const SIGNATURE_HEADER: &str = "x-signature";

/// Header carrying the ISO-8601 signing timestamp.
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

/// Header carrying the 32-hex-character request nonce.
pub const NONCE_HEADER: &str = "x-signature-nonce";

/// Oldest timestamp a verifying server accepts, in milliseconds.
///
/// Verification happens server side; the value is part of the wire contract.
pub const MAX_TIMESTAMP_AGE_MS: i64 = 300_000;

const NONCE_SIZE: usize = 16;

/// The three values attached to a signed request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedHeaders {
    pub signature: String,
    pub timestamp: String,
    pub nonce: String,
}

impl SignedHeaders {
    /// Header name/value pairs in wire order.
    pub fn header_pairs(&self) -> [(&'static str, &str); 3] {
        [
            (SIGNATURE_HEADER, self.signature.as_str()),
            (TIMESTAMP_HEADER, self.timestamp.as_str()),
            (NONCE_HEADER, self.nonce.as_str()),
        ]
    }
}

/// Builds the canonical payload for a request.
///
/// The method is upper-cased and any query string is dropped from the path.
pub fn build_canonical_payload(
    method: &str,
    path: &str,
    timestamp: &str,
    nonce: &str,
    body: &[u8],
) -> String {
    let path = path.split_once('?').map_or(path, |(p, _)| p);
    let body_hash = hex::encode(Sha256::digest(body));
    format!(
        "{}\n{}\n{}\n{}\n{}",
        method.to_ascii_uppercase(),
        path,
        timestamp,
        nonce,
        body_hash
    )
}

/// Signs a canonical payload, returning lowercase hex.
pub fn sign(secret: &[u8], payload: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Generates a fresh 16-byte nonce as 32 lowercase hex characters.
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; NONCE_SIZE];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Formats a signing timestamp, e.g. `2026-03-01T12:00:00.000Z`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Signs a request using the current time and a fresh nonce.
pub fn sign_request(secret: &[u8], method: &str, path: &str, body: &[u8]) -> SignedHeaders {
    let timestamp = format_timestamp(Utc::now());
    let nonce = generate_nonce();
    sign_request_with(secret, method, path, body, &timestamp, &nonce)
}

/// Signs a request with an injected timestamp and nonce.
///
/// Fully deterministic: identical inputs always give identical output.
pub fn sign_request_with(
    secret: &[u8],
    method: &str,
    path: &str,
    body: &[u8],
    timestamp: &str,
    nonce: &str,
) -> SignedHeaders {
    let payload = build_canonical_payload(method, path, timestamp, nonce, body);
    SignedHeaders {
        signature: sign(secret, &payload),
        timestamp: timestamp.to_string(),
        nonce: nonce.to_string(),
    }
}
