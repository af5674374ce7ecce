//! Access token inspection.
//!
//! Access tokens are JWT-shaped (`header.payload.signature`). The client
//! never verifies them; it only reads the payload claims to decide when to
//! refresh. Decoding is total: anything that cannot be read is reported as
//! [`ClaimsState::Unparsable`], and an unparsable token is always stale.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::{DecodePaddingMode, Engine};
use chrono::Utc;
use serde_json::{Map, Value};

/// base64url that accepts payload segments with or without `=` padding.
const SEGMENT_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Claims read from an access token payload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TokenClaims {
    /// Expiry in seconds since the Unix epoch.
    pub exp: Option<i64>,
    pub sub: Option<String>,
    pub email: Option<String>,
    /// Every other claim, untouched.
    pub extra: Map<String, Value>,
}

/// Outcome of reading a token's claims.
#[derive(Clone, Debug, PartialEq)]
pub enum ClaimsState {
    Decoded(TokenClaims),
    Unparsable,
}

impl ClaimsState {
    pub fn claims(&self) -> Option<&TokenClaims> {
        match self {
            ClaimsState::Decoded(claims) => Some(claims),
            ClaimsState::Unparsable => None,
        }
    }

    pub fn into_claims(self) -> Option<TokenClaims> {
        match self {
            ClaimsState::Decoded(claims) => Some(claims),
            ClaimsState::Unparsable => None,
        }
    }

    /// Expiry in seconds, if the token was readable and carried one.
    pub fn expiry(&self) -> Option<i64> {
        self.claims().and_then(|c| c.exp)
    }
}

/// Reads the payload claims of a three-segment token.
pub fn decode_claims(token: &str) -> ClaimsState {
    let segments: Vec<&str> = token.split('.').collect();
    let [_, payload, _] = segments.as_slice() else {
        return ClaimsState::Unparsable;
    };

    let Ok(bytes) = SEGMENT_ENGINE.decode(payload) else {
        return ClaimsState::Unparsable;
    };
    let Ok(Value::Object(mut map)) = serde_json::from_slice::<Value>(&bytes) else {
        return ClaimsState::Unparsable;
    };

    let exp = map
        .remove("exp")
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)));
    let sub = take_string(&mut map, "sub");
    let email = take_string(&mut map, "email");

    ClaimsState::Decoded(TokenClaims {
        exp,
        sub,
        email,
        extra: map,
    })
}

/// True when the token is unreadable, has no `exp`, or expires within
/// `buffer_ms` of now.
pub fn is_expired(token: &str, buffer_ms: i64) -> bool {
    is_expired_at(token, buffer_ms, Utc::now().timestamp_millis())
}

/// [`is_expired`] against an explicit clock reading in milliseconds.
pub fn is_expired_at(token: &str, buffer_ms: i64, now_ms: i64) -> bool {
    match decode_claims(token).expiry() {
        Some(exp) => now_ms > exp.saturating_mul(1000).saturating_sub(buffer_ms),
        None => true,
    }
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key) {
        Some(Value::String(s)) => Some(s),
        Some(other) => {
            // Non-string values stay visible to callers under their original key.
            map.insert(key.to_string(), other);
            None
        }
        None => None,
    }
}
