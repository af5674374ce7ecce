//! AES-256-GCM payload cipher.
//!
//! Every call to [`encrypt`] draws a fresh random IV, so identical plaintext
//! under the same key never produces identical envelopes. The GCM tag is the
//! only integrity check.

use crate::envelope::{AesGcmEnvelope, Envelope};
use crate::error::{CryptoError, CryptoResult};
use crate::key::{ContentKey, IV_SIZE};
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce, Tag};
use rand::RngCore;

/// Encrypts `plaintext` under a hex key and returns envelope JSON.
pub fn encrypt(plaintext: &[u8], key_hex: &str) -> CryptoResult<String> {
    let key = ContentKey::from_hex(key_hex)?;
    let envelope = seal(&key, plaintext)?;
    Ok(Envelope::V1(envelope).to_json())
}

/// Decrypts envelope JSON under a hex key.
///
/// The key is checked first, then the envelope's version and algorithm,
/// then the GCM tag.
pub fn decrypt(envelope_json: &str, key_hex: &str) -> CryptoResult<Vec<u8>> {
    let key = ContentKey::from_hex(key_hex)?;
    match Envelope::parse(envelope_json)? {
        Envelope::V1(envelope) => open(&key, &envelope),
    }
}

/// Encrypts a UTF-8 string.
pub fn encrypt_string(plaintext: &str, key_hex: &str) -> CryptoResult<String> {
    encrypt(plaintext.as_bytes(), key_hex)
}

/// Decrypts an envelope whose plaintext is UTF-8 text.
pub fn decrypt_string(envelope_json: &str, key_hex: &str) -> CryptoResult<String> {
    let bytes = decrypt(envelope_json, key_hex)?;
    String::from_utf8(bytes).map_err(|e| CryptoError::InvalidUtf8(e.to_string()))
}

fn seal(key: &ContentKey, plaintext: &[u8]) -> CryptoResult<AesGcmEnvelope> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    let mut iv = [0u8; IV_SIZE];
    rand::rng().fill_bytes(&mut iv);

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(&iv), b"", &mut buffer)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    Ok(AesGcmEnvelope::from_parts(&iv, tag.as_slice(), &buffer))
}

fn open(key: &ContentKey, envelope: &AesGcmEnvelope) -> CryptoResult<Vec<u8>> {
    let (iv, tag, mut buffer) = envelope.decode()?;

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;

    cipher
        .decrypt_in_place_detached(Nonce::from_slice(&iv), b"", &mut buffer, Tag::from_slice(&tag))
        .map_err(|_| {
            CryptoError::DecryptionFailed(
                "authentication failed (wrong key or tampered data)".to_string(),
            )
        })?;

    Ok(buffer)
}
