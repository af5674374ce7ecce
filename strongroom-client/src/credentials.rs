//! Access/refresh credential lifecycle with deduplicated refresh.
//!
//! The manager holds one credential pair. Callers ask for a usable access
//! token before each API call; when the current one is stale the manager
//! refreshes it through the injected [`RefreshTransport`].
//!
//! At most one refresh exchange runs per refresh token. The first caller
//! installs a shared future in the in-flight slot; every caller arriving
//! before it settles awaits that same future and gets the same token or the
//! same error. The slot is cleared when the exchange settles or when its last
//! waiter goes away, so the next call after a failure or a cancellation
//! starts a fresh exchange.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::token::{self, ClaimsState};
use crate::transport::{RefreshTransport, TransportError};
use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Header that carries the refresh token on the refresh exchange.
///
/// The exchange never sends `Authorization`.
pub const REFRESH_TOKEN_HEADER: &str = "x-refresh-token";

/// Default lead time before expiry at which a token counts as stale.
pub const DEFAULT_REFRESH_BUFFER_MS: i64 = 60_000;

/// Default refresh endpoint, relative to the API base URL.
pub const DEFAULT_REFRESH_PATH: &str = "auth/refresh";

/// The access/refresh token pair held by a manager.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

impl CredentialPair {
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
        }
    }
}

impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Handed to the refresh observer after every successful refresh.
#[derive(Clone, Debug)]
pub struct RefreshedSession {
    /// The pair as it stands after the refresh.
    pub credentials: CredentialPair,
    /// The full refresh response, including user/account summary fields.
    pub response: Value,
}

/// Callback invoked after each successful refresh.
pub type RefreshObserver = Arc<dyn Fn(&RefreshedSession) + Send + Sync>;

/// Observable lifecycle state of the held access token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CredentialState {
    /// Readable and not within the refresh buffer of expiry.
    Fresh,
    /// Unreadable, missing `exp`, expired, or within the refresh buffer.
    Stale,
    /// A refresh exchange is in flight.
    Refreshing,
}

type RefreshFuture = BoxFuture<'static, ClientResult<String>>;
type SharedRefresh = Shared<RefreshFuture>;

/// The exchange currently occupying the in-flight slot.
///
/// Only a weak handle is kept: once every waiter has dropped its clone the
/// exchange future is dropped with it.
struct InFlight {
    id: u64,
    refresh_token: String,
    handle: WeakShared<RefreshFuture>,
}

/// Owned by an exchange future; empties the slot when that future is dropped,
/// whether it ran to completion or was abandoned by all of its waiters.
struct InFlightGuard {
    inner: Weak<Inner>,
    id: u64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let mut slot = inner.in_flight.lock();
        if slot.as_ref().is_some_and(|f| f.id == self.id) {
            *slot = None;
        }
    }
}

struct Inner {
    credentials: RwLock<CredentialPair>,
    in_flight: parking_lot::Mutex<Option<InFlight>>,
    next_exchange_id: AtomicU64,
    /// Bumped each time an exchange stores a new access token.
    generation: AtomicU64,
    observer: parking_lot::RwLock<Option<RefreshObserver>>,
    refresh_buffer_ms: i64,
    refresh_path: String,
}

/// Manages one credential pair. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct CredentialManager {
    inner: Arc<Inner>,
}

impl CredentialManager {
    /// Creates a manager with the default refresh buffer and endpoint.
    pub fn new(credentials: CredentialPair) -> Self {
        Self::build(
            credentials,
            DEFAULT_REFRESH_BUFFER_MS,
            DEFAULT_REFRESH_PATH.to_string(),
        )
    }

    /// Creates a manager using the buffer and endpoint from `config`.
    pub fn from_config(credentials: CredentialPair, config: &ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        Ok(Self::build(
            credentials,
            config.refresh_buffer_ms,
            config.refresh_path.clone(),
        ))
    }

    fn build(credentials: CredentialPair, refresh_buffer_ms: i64, refresh_path: String) -> Self {
        Self {
            inner: Arc::new(Inner {
                credentials: RwLock::new(credentials),
                in_flight: parking_lot::Mutex::new(None),
                next_exchange_id: AtomicU64::new(0),
                generation: AtomicU64::new(0),
                observer: parking_lot::RwLock::new(None),
                refresh_buffer_ms,
                refresh_path,
            }),
        }
    }

    pub fn refresh_buffer_ms(&self) -> i64 {
        self.inner.refresh_buffer_ms
    }

    // ── State ──

    pub async fn access_token(&self) -> String {
        self.inner.credentials.read().await.access_token.clone()
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.inner.credentials.read().await.refresh_token.clone()
    }

    pub async fn has_refresh_token(&self) -> bool {
        self.inner.credentials.read().await.refresh_token.is_some()
    }

    /// Snapshot of the current pair.
    pub async fn credentials(&self) -> CredentialPair {
        self.inner.credentials.read().await.clone()
    }

    /// Claims of the current access token (`sub`, `email`, `exp`, ...).
    pub async fn claims(&self) -> ClaimsState {
        token::decode_claims(&self.inner.credentials.read().await.access_token)
    }

    /// True when the current access token is stale. Fails closed.
    pub async fn needs_refresh(&self) -> bool {
        let credentials = self.inner.credentials.read().await;
        token::is_expired(&credentials.access_token, self.inner.refresh_buffer_ms)
    }

    pub async fn state(&self) -> CredentialState {
        if self.is_refreshing() {
            return CredentialState::Refreshing;
        }
        if self.needs_refresh().await {
            CredentialState::Stale
        } else {
            CredentialState::Fresh
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.in_flight.lock().is_some()
    }

    // ── Mutation ──

    /// Replaces the access token, e.g. after an interactive login.
    pub async fn set_access_token(&self, access_token: impl Into<String>) {
        self.inner.credentials.write().await.access_token = access_token.into();
    }

    /// Explicit refresh token rotation. Refresh itself never rotates it.
    pub async fn set_refresh_token(&self, refresh_token: Option<String>) {
        self.inner.credentials.write().await.refresh_token = refresh_token;
    }

    /// Replaces the whole pair.
    pub async fn set_credentials(&self, credentials: CredentialPair) {
        *self.inner.credentials.write().await = credentials;
    }

    /// Forgets both tokens (logout). Later refreshes fail with `NoRefreshToken`.
    pub async fn clear(&self) {
        *self.inner.credentials.write().await = CredentialPair::new(String::new(), None);
    }

    /// Registers the refresh observer, replacing any previous one.
    pub fn on_refresh<F>(&self, observer: F)
    where
        F: Fn(&RefreshedSession) + Send + Sync + 'static,
    {
        *self.inner.observer.write() = Some(Arc::new(observer));
    }

    // ── Refresh ──

    /// Returns the current access token, refreshing first if it is stale.
    ///
    /// This is what the request layer calls before each outbound request.
    pub async fn valid_access_token(
        &self,
        transport: Arc<dyn RefreshTransport>,
    ) -> ClientResult<String> {
        let observed = {
            let credentials = self.inner.credentials.read().await;
            if !token::is_expired(&credentials.access_token, self.inner.refresh_buffer_ms) {
                return Ok(credentials.access_token.clone());
            }
            self.inner.generation.load(Ordering::SeqCst)
        };
        debug!(
            buffer_ms = self.inner.refresh_buffer_ms,
            "access token stale, refreshing"
        );
        self.refresh_since(transport, Some(observed)).await
    }

    /// Exchanges the refresh token for a new access token.
    ///
    /// Fails with `NoRefreshToken` without touching the transport when no
    /// refresh token is held. Concurrent callers share one exchange.
    pub async fn refresh(&self, transport: Arc<dyn RefreshTransport>) -> ClientResult<String> {
        self.refresh_since(transport, None).await
    }

    /// Refresh entry point shared by [`refresh`](Self::refresh) and
    /// [`valid_access_token`](Self::valid_access_token).
    ///
    /// With `observed` set, the caller saw a stale token at that generation;
    /// if an exchange has stored a new token since, that token is returned
    /// instead of starting another exchange.
    async fn refresh_since(
        &self,
        transport: Arc<dyn RefreshTransport>,
        observed: Option<u64>,
    ) -> ClientResult<String> {
        let Some(refresh_token) = self.refresh_token().await else {
            return Err(ClientError::NoRefreshToken);
        };

        let pending = {
            let mut slot = self.inner.in_flight.lock();
            let joinable = slot
                .as_ref()
                .filter(|f| f.refresh_token == refresh_token)
                .and_then(|f| f.handle.upgrade());

            if let Some(pending) = joinable {
                debug!("joining in-flight token refresh");
                Some(pending)
            } else if observed
                .is_some_and(|seen| seen != self.inner.generation.load(Ordering::SeqCst))
            {
                None
            } else {
                let id = self.inner.next_exchange_id.fetch_add(1, Ordering::SeqCst);
                let guard = InFlightGuard {
                    inner: Arc::downgrade(&self.inner),
                    id,
                };
                let pending = Self::exchange(
                    guard,
                    Arc::downgrade(&self.inner),
                    transport,
                    self.inner.refresh_path.clone(),
                    refresh_token.clone(),
                )
                .boxed()
                .shared();
                *slot = pending.downgrade().map(|handle| InFlight {
                    id,
                    refresh_token,
                    handle,
                });
                Some(pending)
            }
        };

        match pending {
            Some(pending) => pending.await,
            None => {
                debug!("access token already refreshed by a concurrent exchange");
                Ok(self.access_token().await)
            }
        }
    }

    /// Body of the single in-flight refresh.
    ///
    /// Holds only a weak reference to the manager so a pending exchange does
    /// not keep the manager alive. `_guard` lives exactly as long as this
    /// future, polled or not.
    async fn exchange(
        _guard: InFlightGuard,
        inner: Weak<Inner>,
        transport: Arc<dyn RefreshTransport>,
        refresh_path: String,
        refresh_token: String,
    ) -> ClientResult<String> {
        let result = transport
            .post_json(&refresh_path, &[(REFRESH_TOKEN_HEADER, refresh_token.as_str())])
            .await
            .map_err(ClientError::from)
            .and_then(parse_refresh_response);

        let Some(inner) = inner.upgrade() else {
            return result.map(|(access_token, _)| access_token);
        };

        match result {
            Ok((access_token, response)) => {
                let session = {
                    let mut credentials = inner.credentials.write().await;
                    credentials.access_token = access_token.clone();
                    inner.generation.fetch_add(1, Ordering::SeqCst);
                    RefreshedSession {
                        credentials: credentials.clone(),
                        response,
                    }
                };
                info!("access token refreshed");

                let observer = inner.observer.read().clone();
                if let Some(observer) = observer {
                    observer(&session);
                }
                Ok(access_token)
            }
            Err(e) => {
                warn!("token refresh failed: {e}");
                Err(e)
            }
        }
    }
}

impl fmt::Debug for CredentialManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialManager")
            .field("refresh_buffer_ms", &self.inner.refresh_buffer_ms)
            .field("refresh_path", &self.inner.refresh_path)
            .field("refreshing", &self.is_refreshing())
            .finish_non_exhaustive()
    }
}

/// Pulls the new access token out of a refresh response.
///
/// Accepts `accessToken` or `access_token`; the full body is kept for the
/// observer.
fn parse_refresh_response(response: Value) -> ClientResult<(String, Value)> {
    let access_token = response
        .get("accessToken")
        .or_else(|| response.get("access_token"))
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| {
            ClientError::RefreshExchangeFailed(TransportError::Decode(
                "refresh response missing accessToken".to_string(),
            ))
        })?;
    Ok((access_token, response))
}
