//! Client builder for constructing [`FiscalClient`] instances.
//!
//! This module is responsible for:
//! - Validating credentials (all four fields present, URLs are http/https)
//! - Normalizing the API base URL (removing trailing slashes)
//! - Configuring the underlying HTTP client (timeout, redirects)
//! - Creating a [`TokenCache`] or adopting an injected one
//!
//! # What this module does NOT handle:
//! - Loading configuration (see `nuvem_fiscal_config::ConfigLoader`)
//!
//! # Invariants
//! - Either `credentials` or `token_cache` must be provided before `build()`
//! - An injected token cache is shared as-is; its credentials define the base URL
//!   unless explicit credentials are also given
//! - A clock cannot be combined with an injected token cache

use std::sync::Arc;
use std::time::Duration;

use nuvem_fiscal_config::Config;
use nuvem_fiscal_config::constants::{DEFAULT_MAX_REDIRECTS, DEFAULT_TIMEOUT_SECS};
use secrecy::ExposeSecret;

use crate::auth::{Clock, Credentials, TokenCache};
use crate::client::FiscalClient;
use crate::error::{ClientError, Result};
use crate::metrics::MetricsCollector;

/// Builder for [`FiscalClient`].
///
/// ```rust,ignore
/// let client = FiscalClient::builder()
///     .from_config(&config)
///     .metrics(MetricsCollector::new())
///     .build()?;
/// ```
pub struct FiscalClientBuilder {
    credentials: Option<Credentials>,
    token_cache: Option<Arc<TokenCache>>,
    timeout: Duration,
    retry_on_unauthorized: bool,
    metrics: Option<MetricsCollector>,
    clock: Option<Arc<dyn Clock>>,
}

impl Default for FiscalClientBuilder {
    fn default() -> Self {
        Self {
            credentials: None,
            token_cache: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry_on_unauthorized: false,
            metrics: None,
            clock: None,
        }
    }
}

impl FiscalClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Share an existing token cache instead of creating one.
    ///
    /// The cache keeps its own clock, exchange timeout and metrics.
    /// Combining it with [`Self::clock`] is rejected by `build()`.
    pub fn token_cache(mut self, cache: Arc<TokenCache>) -> Self {
        self.token_cache = Some(cache);
        self
    }

    /// Client-wide timeout for API calls, and for token exchanges of a cache
    /// created by this builder.
    ///
    /// Default is 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Re-attempt a call once after the API answers 401.
    ///
    /// Default is `false`: the 401 is returned to the caller.
    pub fn retry_on_unauthorized(mut self, enabled: bool) -> Self {
        self.retry_on_unauthorized = enabled;
        self
    }

    /// Record request metrics, and token metrics for a cache created by this
    /// builder. An injected cache records token metrics only if it was built
    /// with [`TokenCache::with_metrics`].
    pub fn metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Clock used by a token cache created by this builder.
    ///
    /// Not valid together with [`Self::token_cache`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Pre-configure the builder from loaded configuration.
    pub fn from_config(mut self, config: &Config) -> Self {
        self.credentials = Some(Credentials::from(&config.credentials));
        self.timeout = config.connection.timeout;
        self.retry_on_unauthorized = config.connection.retry_on_unauthorized;
        self
    }

    fn normalize_base_url(url: &str) -> String {
        url.trim_end_matches('/').to_string()
    }

    fn validate_url(field: &str, value: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(ClientError::MissingCredentials(format!("{field} is required")));
        }
        let parsed = reqwest::Url::parse(value)
            .map_err(|e| ClientError::InvalidUrl(format!("{field} '{value}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(ClientError::InvalidUrl(format!(
                "{field} '{value}' must be an http(s) URL with a host"
            )));
        }
        Ok(())
    }

    fn validate_credentials(credentials: &Credentials) -> Result<()> {
        if credentials.client_id.trim().is_empty() {
            return Err(ClientError::MissingCredentials(
                "client_id is required".to_string(),
            ));
        }
        if credentials.client_secret.expose_secret().trim().is_empty() {
            return Err(ClientError::MissingCredentials(
                "client_secret is required".to_string(),
            ));
        }
        Self::validate_url("token_url", &credentials.token_url)?;
        Self::validate_url("api_base_url", &credentials.api_base_url)
    }

    /// Build the [`FiscalClient`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingCredentials`] if neither credentials nor a
    /// token cache were provided, or a credential field is empty.
    /// Returns [`ClientError::InvalidUrl`] if a URL is malformed.
    /// Returns [`ClientError::HttpError`] if the HTTP client fails to build.
    /// Returns [`ClientError::ConflictingOptions`] if a clock is set for an
    /// injected token cache.
    pub fn build(self) -> Result<FiscalClient> {
        if self.token_cache.is_some() && self.clock.is_some() {
            return Err(ClientError::ConflictingOptions(
                "clock cannot be applied to an injected token_cache; use TokenCache::with_clock"
                    .to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .redirect(reqwest::redirect::Policy::limited(DEFAULT_MAX_REDIRECTS))
            .build()?;

        let (token_cache, api_base_url) = match (self.token_cache, self.credentials) {
            (Some(cache), Some(credentials)) => {
                Self::validate_url("api_base_url", &credentials.api_base_url)?;
                (cache, credentials.api_base_url)
            }
            (Some(cache), None) => {
                let api_base_url = cache.credentials().api_base_url.clone();
                Self::validate_url("api_base_url", &api_base_url)?;
                (cache, api_base_url)
            }
            (None, Some(credentials)) => {
                Self::validate_credentials(&credentials)?;
                let api_base_url = credentials.api_base_url.clone();
                let mut cache =
                    TokenCache::new(credentials, http.clone()).with_exchange_timeout(self.timeout);
                if let Some(clock) = self.clock {
                    cache = cache.with_clock(clock);
                }
                if let Some(metrics) = &self.metrics {
                    cache = cache.with_metrics(metrics.clone());
                }
                (Arc::new(cache), api_base_url)
            }
            (None, None) => {
                return Err(ClientError::MissingCredentials(
                    "credentials or token_cache is required".to_string(),
                ));
            }
        };

        Ok(FiscalClient {
            http,
            base_url: Self::normalize_base_url(&api_base_url),
            token_cache,
            retry_on_unauthorized: self.retry_on_unauthorized,
            metrics: self.metrics,
        })
    }
}
