//! Request header decoration: bearer tokens and optional HMAC signatures.

mod support;

use std::sync::Arc;
use strongroom_client::crypto::signing::{
    self, NONCE_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
use strongroom_client::{
    ClientConfig, ClientError, CredentialManager, CredentialPair, RequestAuthorizer,
};
use support::{fresh_token, refresh_body, stale_token, CountingTransport};

fn authorizer(access_token: String) -> (RequestAuthorizer, Arc<CountingTransport>) {
    let transport = Arc::new(CountingTransport::ok(refresh_body(&fresh_token())));
    let manager = CredentialManager::new(CredentialPair::new(access_token, Some("rt".into())));
    (RequestAuthorizer::new(manager, transport.clone()), transport)
}

fn header<'a>(headers: &'a reqwest::header::HeaderMap, name: &str) -> &'a str {
    headers.get(name).unwrap().to_str().unwrap()
}

// ── Bearer ──

#[tokio::test]
async fn fresh_token_is_attached_without_refresh() {
    let token = fresh_token();
    let (authorizer, transport) = authorizer(token.clone());

    let headers = authorizer.authorize("GET", "/vaults", b"").await.unwrap();

    assert_eq!(header(&headers, "authorization"), format!("Bearer {token}"));
    assert!(headers.get("authorization").unwrap().is_sensitive());
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn stale_token_is_refreshed_first() {
    let (authorizer, transport) = authorizer(stale_token());

    let headers = authorizer.authorize("GET", "/vaults", b"").await.unwrap();
    let current = authorizer.manager().access_token().await;

    assert_eq!(header(&headers, "authorization"), format!("Bearer {current}"));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn unsigned_authorizer_adds_only_bearer() {
    let (authorizer, _) = authorizer(fresh_token());
    assert!(!authorizer.is_signing());

    let headers = authorizer.authorize("POST", "/documents", b"{}").await.unwrap();
    assert_eq!(headers.len(), 1);
    assert!(headers.get(SIGNATURE_HEADER).is_none());
}

#[tokio::test]
async fn missing_refresh_token_surfaces_reauthentication() {
    let transport = Arc::new(CountingTransport::ok(refresh_body(&fresh_token())));
    let manager = CredentialManager::new(CredentialPair::new(stale_token(), None));
    let authorizer = RequestAuthorizer::new(manager, transport.clone());

    let err = authorizer.authorize("GET", "/vaults", b"").await.unwrap_err();
    assert_eq!(err, ClientError::NoRefreshToken);
    assert_eq!(transport.calls(), 0);
}

// ── Signing ──

#[tokio::test]
async fn signing_adds_three_headers() {
    let (authorizer, _) = authorizer(fresh_token());
    let authorizer = authorizer.with_signing_secret(b"api-key-secret".to_vec());
    assert!(authorizer.is_signing());

    let headers = authorizer.authorize("post", "/documents?draft=1", b"{\"a\":1}").await.unwrap();

    assert_eq!(headers.len(), 4);
    let signature = header(&headers, SIGNATURE_HEADER);
    let timestamp = header(&headers, TIMESTAMP_HEADER);
    let nonce = header(&headers, NONCE_HEADER);
    assert_eq!(signature.len(), 64);
    assert_eq!(nonce.len(), 32);
    assert!(timestamp.ends_with('Z'));
}

#[tokio::test]
async fn signature_verifies_against_canonical_payload() {
    let secret = b"api-key-secret";
    let body = br#"{"title":"Q3 plan"}"#;
    let (authorizer, _) = authorizer(fresh_token());
    let authorizer = authorizer.with_signing_secret(secret.to_vec());

    let headers = authorizer.authorize("PUT", "/documents/42?rev=3", body).await.unwrap();

    let expected = signing::sign_request_with(
        secret,
        "PUT",
        "/documents/42",
        body,
        header(&headers, TIMESTAMP_HEADER),
        header(&headers, NONCE_HEADER),
    );
    assert_eq!(header(&headers, SIGNATURE_HEADER), expected.signature);
}

#[tokio::test]
async fn each_request_gets_a_new_nonce() {
    let (authorizer, _) = authorizer(fresh_token());
    let authorizer = authorizer.with_signing_secret(b"k".to_vec());

    let a = authorizer.authorize("GET", "/vaults", b"").await.unwrap();
    let b = authorizer.authorize("GET", "/vaults", b"").await.unwrap();
    assert_ne!(header(&a, NONCE_HEADER), header(&b, NONCE_HEADER));
}

// ── Config ──

#[test]
fn from_config_without_signing_ignores_secret() {
    let transport = Arc::new(CountingTransport::ok(refresh_body(&fresh_token())));
    let manager = CredentialManager::new(CredentialPair::new(fresh_token(), None));

    let authorizer = RequestAuthorizer::from_config(
        &ClientConfig::default(),
        manager,
        transport,
        Some(b"secret".to_vec()),
    )
    .unwrap();
    assert!(!authorizer.is_signing());
}

#[test]
fn from_config_with_signing_and_secret() {
    let config = ClientConfig {
        signing_enabled: true,
        ..ClientConfig::default()
    };
    let transport = Arc::new(CountingTransport::ok(refresh_body(&fresh_token())));
    let manager = CredentialManager::new(CredentialPair::new(fresh_token(), None));

    let authorizer =
        RequestAuthorizer::from_config(&config, manager, transport, Some(b"secret".to_vec()))
            .unwrap();
    assert!(authorizer.is_signing());
}

#[test]
fn from_config_signing_without_secret_is_rejected() {
    let config = ClientConfig {
        signing_enabled: true,
        ..ClientConfig::default()
    };

    for secret in [None, Some(Vec::new())] {
        let transport = Arc::new(CountingTransport::ok(refresh_body(&fresh_token())));
        let manager = CredentialManager::new(CredentialPair::new(fresh_token(), None));
        let result = RequestAuthorizer::from_config(&config, manager, transport, secret);
        assert!(matches!(result, Err(ClientError::Config(_))));
    }
}
