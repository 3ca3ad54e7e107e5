//! OAuth2 client-credentials token cache.
//!
//! Responsibilities:
//! - Hold at most one bearer token together with its (already margin-adjusted) expiry.
//! - Serve the cached token without I/O while it is fresh.
//! - Exchange client credentials at the token endpoint when the slot is cold or stale.
//! - Drop the token on demand (`invalidate`) after the API rejects it.
//!
//! Does NOT handle:
//! - Attaching the token to API requests (see [`crate::FiscalClient`]).
//! - Background refresh. Freshness is checked lazily on every read.
//!
//! Invariants:
//! - The slot lock is never held across an `.await`.
//! - Cold-path exchanges are serialized by the refresh gate; callers that
//!   queued behind an in-flight exchange reuse its result, success or
//!   failure, instead of issuing their own.
//! - A failed exchange leaves the slot untouched.
//! - Every exchange is bounded by the exchange timeout.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use nuvem_fiscal_config::CredentialsConfig;
use nuvem_fiscal_config::constants::{
    DEFAULT_SCOPE, DEFAULT_TIMEOUT_SECS, TOKEN_SAFETY_MARGIN_SECS,
};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::endpoints;
use crate::error::TokenError;
use crate::metrics::MetricsCollector;

/// Client credentials for the token endpoint and the API base URL.
///
/// Immutable once constructed. The secret never appears in `Debug` output.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: SecretString,
    pub token_url: String,
    pub api_base_url: String,
    pub scope: String,
}

impl Credentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: SecretString,
        token_url: impl Into<String>,
        api_base_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
            token_url: token_url.into(),
            api_base_url: api_base_url.into(),
            scope: DEFAULT_SCOPE.to_string(),
        }
    }

    /// Override the space-separated scope list sent with the exchange.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }
}

impl From<&CredentialsConfig> for Credentials {
    fn from(config: &CredentialsConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            token_url: config.token_url.clone(),
            api_base_url: config.api_base_url.clone(),
            scope: config.scope.clone(),
        }
    }
}

/// Source of wall-clock time in epoch milliseconds.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now_millis(&self) -> i64;
}

/// [`Clock`] backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Observable state of the cache slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// No token, or the token is past its expiry.
    Cold,
    /// A token is present and fresh.
    Warm,
}

/// Bearer token with its margin-adjusted expiry.
#[derive(Debug, Clone)]
struct CachedToken {
    value: SecretString,
    expires_at_millis: i64,
}

impl CachedToken {
    /// `expires_at = issued_at + (expires_in - margin) * 1000`, saturating at
    /// `issued_at` when the server lifetime does not exceed the margin.
    fn new(value: String, issued_at_millis: i64, expires_in_secs: u64, margin_secs: u64) -> Self {
        let usable_secs = expires_in_secs.saturating_sub(margin_secs);
        let usable_millis = i64::try_from(usable_secs)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000);
        Self {
            value: SecretString::from(value),
            expires_at_millis: issued_at_millis.saturating_add(usable_millis),
        }
    }

    fn is_fresh(&self, now_millis: i64) -> bool {
        now_millis < self.expires_at_millis
    }
}

/// Single-slot cache for the client-credentials bearer token.
///
/// Constructed explicitly and shared through `Arc`; there is no global instance.
pub struct TokenCache {
    http: reqwest::Client,
    credentials: Credentials,
    clock: Arc<dyn Clock>,
    safety_margin_secs: u64,
    exchange_timeout: Duration,
    slot: RwLock<Option<CachedToken>>,
    /// Serializes exchanges and holds the failure of the latest one.
    refresh_gate: Mutex<Option<TokenError>>,
    /// Completed exchanges, successful or not.
    exchanges: AtomicU64,
    metrics: Option<MetricsCollector>,
}

impl fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCache")
            .field("token_url", &self.credentials.token_url)
            .field("client_id", &self.credentials.client_id)
            .field("state", &self.state())
            .field("expires_at_millis", &self.expires_at_millis())
            .finish_non_exhaustive()
    }
}

impl TokenCache {
    /// Create a cold cache that exchanges `credentials` through `http`.
    ///
    /// Each exchange is bounded by the exchange timeout (30 seconds unless
    /// changed with [`Self::with_exchange_timeout`]), even when `http` has
    /// no timeout of its own.
    pub fn new(credentials: Credentials, http: reqwest::Client) -> Self {
        Self {
            http,
            credentials,
            clock: Arc::new(SystemClock),
            safety_margin_secs: TOKEN_SAFETY_MARGIN_SECS,
            exchange_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            slot: RwLock::new(None),
            refresh_gate: Mutex::new(None),
            exchanges: AtomicU64::new(0),
            metrics: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Seconds subtracted from the server-reported lifetime. Defaults to 300.
    pub fn with_safety_margin_secs(mut self, secs: u64) -> Self {
        self.safety_margin_secs = secs;
        self
    }

    pub fn with_exchange_timeout(mut self, timeout: Duration) -> Self {
        self.exchange_timeout = timeout;
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Return a valid bearer token, exchanging credentials when needed.
    ///
    /// # Errors
    ///
    /// Returns a [`TokenError`] when the exchange fails. Nothing is cached in
    /// that case. Callers already queued behind the failed exchange receive
    /// the same error; later calls try again.
    #[tracing::instrument(skip(self), fields(token_url = %self.credentials.token_url))]
    pub async fn get_token(&self) -> Result<String, TokenError> {
        if let Some(token) = self.fresh_token() {
            debug!("Token cache hit");
            self.record(MetricsCollector::record_token_cache_hit);
            return Ok(token);
        }

        let seen = self.exchanges.load(Ordering::Acquire);
        let mut last_failure = self.refresh_gate.lock().await;

        // Another caller may have completed an exchange while we waited.
        if let Some(token) = self.fresh_token() {
            debug!("Token refreshed by concurrent caller");
            self.record(MetricsCollector::record_token_cache_hit);
            return Ok(token);
        }
        if self.exchanges.load(Ordering::Acquire) != seen
            && let Some(error) = last_failure.as_ref()
        {
            debug!("Concurrent token exchange failed, sharing its error");
            return Err(error.clone());
        }

        self.record(MetricsCollector::record_token_cache_miss);
        debug!("Token cache cold or stale, exchanging client credentials");

        let issued_at = self.clock.now_millis();
        let outcome = endpoints::exchange_client_credentials(
            &self.http,
            &self.credentials,
            self.exchange_timeout,
        )
        .await;
        self.exchanges.fetch_add(1, Ordering::Release);

        let response = match outcome {
            Ok(response) => {
                *last_failure = None;
                response
            }
            Err(e) => {
                warn!(error = %e, "Token exchange failed");
                if let Some(metrics) = &self.metrics {
                    metrics.record_token_exchange(false);
                }
                *last_failure = Some(e.clone());
                return Err(e);
            }
        };

        let cached = CachedToken::new(
            response.access_token,
            issued_at,
            response.expires_in,
            self.safety_margin_secs,
        );
        let value = cached.value.expose_secret().to_string();
        info!(
            expires_in = response.expires_in,
            expires_at_millis = cached.expires_at_millis,
            "Obtained access token"
        );
        if let Some(metrics) = &self.metrics {
            metrics.record_token_exchange(true);
        }

        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(cached);
        Ok(value)
    }

    /// Drop the cached token. Idempotent; performs no I/O.
    pub fn invalidate(&self) {
        let previous = self
            .slot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if previous.is_some() {
            debug!("Token invalidated");
        }
    }

    /// Drop the cached token only if it is still `rejected`.
    ///
    /// Returns `true` when the slot was cleared. A token refreshed by another
    /// caller after `rejected` was handed out is kept.
    pub fn invalidate_if(&self, rejected: &str) -> bool {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        let matches = slot
            .as_ref()
            .is_some_and(|t| t.value.expose_secret() == rejected);
        if matches {
            *slot = None;
            debug!("Rejected token invalidated");
        }
        matches
    }

    pub fn state(&self) -> TokenState {
        if self.fresh_token().is_some() {
            TokenState::Warm
        } else {
            TokenState::Cold
        }
    }

    /// Expiry of the stored token in epoch milliseconds, fresh or not.
    pub fn expires_at_millis(&self) -> Option<i64> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|t| t.expires_at_millis)
    }

    fn fresh_token(&self) -> Option<String> {
        let now = self.clock.now_millis();
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|t| t.is_fresh(now))
            .map(|t| t.value.expose_secret().to_string())
    }

    fn record(&self, f: fn(&MetricsCollector)) {
        if let Some(metrics) = &self.metrics {
            f(metrics);
        }
    }
}
