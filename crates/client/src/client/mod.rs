//! Authenticated HTTP client for the Nuvem Fiscal REST API.
//!
//! # Submodules
//! - [`builder`]: Client construction and validation
//! - `request`: JSON requests and the GET/POST/PUT/DELETE wrappers
//! - `upload`: Multipart file uploads
//!
//! # What this module does NOT handle:
//! - Token lifetime and the client-credentials exchange (see [`crate::TokenCache`])
//! - Mapping statuses to categories (see `endpoints::classify`)
//!
//! # Invariants
//! - Every call obtains a token before the API request is sent.
//! - A 401 from the API drops the rejected token from the shared cache,
//!   unless another caller already replaced it.
//! - At most one re-attempt per call, and only after a 401, when enabled.

pub mod builder;
mod request;
mod upload;

use std::sync::Arc;
use std::time::Duration;

use crate::auth::TokenCache;
use crate::cancellation::CancellationToken;
use crate::metrics::MetricsCollector;

/// Nuvem Fiscal API client.
///
/// Cheap to share: wrap it in an `Arc` and call it from any number of tasks.
///
/// ```rust,ignore
/// use nuvem_fiscal_client::{Credentials, FiscalClient};
/// use secrecy::SecretString;
///
/// let client = FiscalClient::builder()
///     .credentials(Credentials::new(
///         "client-id",
///         SecretString::from("client-secret".to_string()),
///         "https://auth.nuvemfiscal.com.br/oauth/token",
///         "https://api.sandbox.nuvemfiscal.com.br",
///     ))
///     .build()?;
///
/// let empresas = client.get::<serde_json::Value>("/empresas", None).await?;
/// ```
#[derive(Debug)]
pub struct FiscalClient {
    pub(crate) http: reqwest::Client,
    pub(crate) base_url: String,
    pub(crate) token_cache: Arc<TokenCache>,
    pub(crate) retry_on_unauthorized: bool,
    pub(crate) metrics: Option<MetricsCollector>,
}

impl FiscalClient {
    pub fn builder() -> builder::FiscalClientBuilder {
        builder::FiscalClientBuilder::new()
    }

    /// API base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The token cache shared by this client.
    pub fn token_cache(&self) -> &Arc<TokenCache> {
        &self.token_cache
    }

    pub fn retries_on_unauthorized(&self) -> bool {
        self.retry_on_unauthorized
    }
}

/// Per-call overrides.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Timeout for the API call, replacing the client-wide timeout.
    pub timeout: Option<Duration>,
    /// Aborts the token fetch or the API call when cancelled.
    pub cancel: Option<CancellationToken>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}
