//! Shared fixtures for strongroom-client integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use strongroom_client::{RefreshTransport, TransportError, TransportResult};
use tokio::sync::Semaphore;

/// Builds an unsigned JWT-shaped token with the given payload.
pub fn token_with_payload(payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.c2lnbmF0dXJl")
}

/// Token whose `exp` lies `secs` seconds from now (negative = past).
pub fn token_expiring_in(secs: i64) -> String {
    token_with_payload(&json!({
        "exp": Utc::now().timestamp() + secs,
        "sub": "user-7",
        "email": "ada@example.com",
    }))
}

pub fn fresh_token() -> String {
    token_expiring_in(3600)
}

pub fn stale_token() -> String {
    token_expiring_in(-60)
}

/// Successful refresh body as the API returns it.
pub fn refresh_body(access_token: &str) -> Value {
    json!({
        "accessToken": access_token,
        "user": { "id": "user-7", "email": "ada@example.com", "plan": "team" }
    })
}

/// Transport that records every exchange and returns a configurable outcome.
pub struct CountingTransport {
    calls: AtomicUsize,
    outcome: parking_lot::Mutex<TransportResult<Value>>,
    last_path: parking_lot::Mutex<Option<String>>,
    last_headers: parking_lot::Mutex<Vec<(String, String)>>,
    delay: Duration,
}

impl CountingTransport {
    pub fn ok(body: Value) -> Self {
        Self::with_outcome(Ok(body))
    }

    pub fn failing(err: TransportError) -> Self {
        Self::with_outcome(Err(err))
    }

    fn with_outcome(outcome: TransportResult<Value>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            outcome: parking_lot::Mutex::new(outcome),
            last_path: parking_lot::Mutex::new(None),
            last_headers: parking_lot::Mutex::new(Vec::new()),
            delay: Duration::from_millis(20),
        }
    }

    pub fn set_outcome(&self, outcome: TransportResult<Value>) {
        *self.outcome.lock() = outcome;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_path(&self) -> Option<String> {
        self.last_path.lock().clone()
    }

    pub fn last_headers(&self) -> Vec<(String, String)> {
        self.last_headers.lock().clone()
    }
}

#[async_trait]
impl RefreshTransport for CountingTransport {
    async fn post_json(&self, path: &str, headers: &[(&str, &str)]) -> TransportResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_path.lock() = Some(path.to_string());
        *self.last_headers.lock() = headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        tokio::time::sleep(self.delay).await;
        let outcome = self.outcome.lock().clone();
        outcome
    }
}

/// Transport that blocks every exchange until the test opens the gate.
pub struct GatedTransport {
    calls: AtomicUsize,
    gate: Semaphore,
    body: Value,
}

impl GatedTransport {
    pub fn new(body: Value) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            gate: Semaphore::new(0),
            body,
        }
    }

    pub fn open(&self) {
        self.gate.add_permits(Semaphore::MAX_PERMITS / 2);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RefreshTransport for GatedTransport {
    async fn post_json(&self, _path: &str, _headers: &[(&str, &str)]) -> TransportResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        drop(permit);
        Ok(self.body.clone())
    }
}
