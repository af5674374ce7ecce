//! Client-side crypto for Strongroom.
//!
//! Two independent, stateless pieces live here:
//!
//! 1. **Payload cipher**: AES-256-GCM encryption of document content into a
//!    self-describing JSON envelope. Each envelope pins its own version and
//!    algorithm, so old records stay readable after a scheme migration.
//!
//! 2. **Request signer**: HMAC-SHA256 over a canonical
//!    `METHOD\nPATH\nTIMESTAMP\nNONCE\nBODYHASH` payload, emitted as three
//!    request headers for server-side replay protection.
//!
//! Keys travel as 64-character hex strings and are never written into an
//! envelope. Decoded key bytes are zeroized on drop.

mod cipher;
pub mod envelope;
mod error;
mod key;
pub mod signing;

pub use cipher::{decrypt, decrypt_string, encrypt, encrypt_string};
pub use envelope::{
    is_envelope, AesGcmEnvelope, Envelope, ALGORITHM_AES_256_GCM, ENVELOPE_VERSION_1,
};
pub use error::{CryptoError, CryptoResult};
pub use key::{generate_key, ContentKey, IV_SIZE, KEY_SIZE, TAG_SIZE};
pub use signing::{
    build_canonical_payload, format_timestamp, generate_nonce, sign, sign_request,
    sign_request_with, SignedHeaders, MAX_TIMESTAMP_AGE_MS, NONCE_HEADER, SIGNATURE_HEADER,
    TIMESTAMP_HEADER,
};
