//! Self-describing envelope for encrypted document content.
//!
//! Wire form (field order is part of the contract):
//!
//! ```json
//! {"version":1,"algorithm":"aes-256-gcm","iv":"<24 hex>",
//!  "authTag":"<32 hex>","ciphertext":"<hex>"}
//! ```
//!
//! Envelopes are a tagged union keyed by `version`. A future scheme gets a
//! new variant; version-1 records stay decryptable forever.

use crate::error::{CryptoError, CryptoResult};
use crate::key::{IV_SIZE, TAG_SIZE};
use serde::Serialize;
use serde_json::Value;

/// Envelope version written by this crate.
pub const ENVELOPE_VERSION_1: i64 = 1;

/// Algorithm tag carried by version-1 envelopes.
pub const ALGORITHM_AES_256_GCM: &str = "aes-256-gcm";

const REQUIRED_V1_FIELDS: [&str; 4] = ["algorithm", "iv", "authTag", "ciphertext"];

/// A parsed envelope of any supported version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Envelope {
    V1(AesGcmEnvelope),
}

/// Version 1: AES-256-GCM with a detached tag and no associated data.
///
/// Fields hold the hex strings exactly as they appeared on the wire; they
/// are only decoded when the envelope is opened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AesGcmEnvelope {
    pub iv: String,
    pub auth_tag: String,
    pub ciphertext: String,
}

#[derive(Serialize)]
struct WireV1<'a> {
    version: i64,
    algorithm: &'a str,
    iv: &'a str,
    #[serde(rename = "authTag")]
    auth_tag: &'a str,
    ciphertext: &'a str,
}

impl Envelope {
    /// Parses envelope JSON, checking version and algorithm before fields.
    pub fn parse(text: &str) -> CryptoResult<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|_| CryptoError::MalformedEnvelope("not valid JSON".to_string()))?;

        let obj = value.as_object().ok_or_else(|| {
            CryptoError::MalformedEnvelope("expected a JSON object".to_string())
        })?;

        match version_of(obj.get("version")) {
            Some(ENVELOPE_VERSION_1) => AesGcmEnvelope::from_json(&value).map(Envelope::V1),
            _ => Err(CryptoError::UnsupportedVersion(render(obj.get("version")))),
        }
    }

    /// Serializes the envelope to its compact wire form.
    pub fn to_json(&self) -> String {
        match self {
            Envelope::V1(env) => env.to_json(),
        }
    }

    pub fn version(&self) -> i64 {
        match self {
            Envelope::V1(_) => ENVELOPE_VERSION_1,
        }
    }

    pub fn algorithm(&self) -> &'static str {
        match self {
            Envelope::V1(_) => ALGORITHM_AES_256_GCM,
        }
    }
}

impl AesGcmEnvelope {
    /// Builds an envelope from raw parts, hex-encoding each.
    pub fn from_parts(iv: &[u8], auth_tag: &[u8], ciphertext: &[u8]) -> Self {
        Self {
            iv: hex::encode(iv),
            auth_tag: hex::encode(auth_tag),
            ciphertext: hex::encode(ciphertext),
        }
    }

    fn from_json(value: &Value) -> CryptoResult<Self> {
        let algorithm = value.get("algorithm");
        if algorithm.and_then(Value::as_str) != Some(ALGORITHM_AES_256_GCM) {
            return Err(CryptoError::UnsupportedAlgorithm(render(algorithm)));
        }

        Ok(Self {
            iv: string_field(value, "iv")?,
            auth_tag: string_field(value, "authTag")?,
            ciphertext: string_field(value, "ciphertext")?,
        })
    }

    pub fn to_json(&self) -> String {
        let wire = WireV1 {
            version: ENVELOPE_VERSION_1,
            algorithm: ALGORITHM_AES_256_GCM,
            iv: &self.iv,
            auth_tag: &self.auth_tag,
            ciphertext: &self.ciphertext,
        };
        // A struct of plain strings and an integer always serializes.
        serde_json::to_string(&wire).unwrap_or_default()
    }

    /// Decodes the hex fields into IV, tag and ciphertext bytes.
    ///
    /// Corrupt or truncated hex is reported as `DecryptionFailed`: from the
    /// caller's point of view it is indistinguishable from tampering.
    pub(crate) fn decode(&self) -> CryptoResult<([u8; IV_SIZE], [u8; TAG_SIZE], Vec<u8>)> {
        let iv: [u8; IV_SIZE] = decode_fixed(&self.iv, "iv")?;
        let tag: [u8; TAG_SIZE] = decode_fixed(&self.auth_tag, "authTag")?;
        let ciphertext = hex::decode(&self.ciphertext).map_err(|e| {
            CryptoError::DecryptionFailed(format!("ciphertext is not valid hex: {e}"))
        })?;
        Ok((iv, tag, ciphertext))
    }
}

/// Cheap structural probe: is this text a version-1 envelope?
///
/// No cryptographic work is done. Used to decide whether stored content
/// needs decrypting before display.
pub fn is_envelope(text: &str) -> bool {
    let Ok(value) = serde_json::from_str::<Value>(text) else {
        return false;
    };
    let Some(obj) = value.as_object() else {
        return false;
    };

    version_of(obj.get("version")) == Some(ENVELOPE_VERSION_1)
        && REQUIRED_V1_FIELDS.iter().all(|field| obj.contains_key(*field))
}

/// Reads `version` as an integer. JSON numbers written as `1.0` count as 1;
/// fractional values and non-numbers do not.
fn version_of(value: Option<&Value>) -> Option<i64> {
    let value = value?;
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|v| v.fract() == 0.0 && v.abs() <= i64::MAX as f64)
            .map(|v| v as i64)
    })
}

fn string_field(value: &Value, name: &str) -> CryptoResult<String> {
    value
        .get(name)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| CryptoError::MalformedEnvelope(format!("missing string field `{name}`")))
}

fn decode_fixed<const N: usize>(field: &str, name: &str) -> CryptoResult<[u8; N]> {
    let bytes = hex::decode(field)
        .map_err(|e| CryptoError::DecryptionFailed(format!("{name} is not valid hex: {e}")))?;
    bytes.try_into().map_err(|b: Vec<u8>| {
        CryptoError::DecryptionFailed(format!("{name} must be {N} bytes, got {}", b.len()))
    })
}

fn render(value: Option<&Value>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "missing".to_string(),
    }
}
