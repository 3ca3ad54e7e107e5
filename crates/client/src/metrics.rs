//! Metrics collection for token exchanges and API calls.
//!
//! This module records, through the `metrics` crate facade:
//! - Token exchange outcomes and token cache hits/misses
//! - Request latency histograms
//! - Errors by [`ErrorCategory`]
//!
//! # What this module does NOT handle:
//! - Metrics exposition/export (install a recorder in the host application)
//!
//! # Invariants
//! - All request metrics use the label names `path`, `method`, `status`, `error_category`
//! - Metric recording is infallible and never disrupts an API call
//! - Zero-cost when no metrics recorder is installed

use std::time::Duration;

use crate::error::ErrorCategory;

/// Metric name for request duration histogram.
pub const METRIC_REQUEST_DURATION: &str = "nuvem_fiscal_request_duration_seconds";

/// Metric name for total request counter.
pub const METRIC_REQUESTS_TOTAL: &str = "nuvem_fiscal_requests_total";

/// Metric name for error counter.
pub const METRIC_ERRORS_TOTAL: &str = "nuvem_fiscal_errors_total";

/// Metric name for the unauthorized re-attempt counter.
pub const METRIC_RETRIES_TOTAL: &str = "nuvem_fiscal_retries_total";

/// Metric name for token exchange counter, labelled by `outcome`.
pub const METRIC_TOKEN_EXCHANGES: &str = "nuvem_fiscal_token_exchanges_total";

/// Metric name for token cache hit counter.
pub const METRIC_TOKEN_CACHE_HITS: &str = "nuvem_fiscal_token_cache_hits_total";

/// Metric name for token cache miss counter.
pub const METRIC_TOKEN_CACHE_MISSES: &str = "nuvem_fiscal_token_cache_misses_total";

/// Metrics collector for token and API activity.
///
/// # Example
///
/// ```rust,ignore
/// use nuvem_fiscal_client::metrics::MetricsCollector;
///
/// let collector = MetricsCollector::new();
/// collector.record_request_duration("/empresas", "GET", Duration::from_millis(150), Some(200));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    enabled: bool,
}

impl MetricsCollector {
    /// Create an enabled collector.
    pub fn new() -> Self {
        Self { enabled: true }
    }

    /// Create a collector that records nothing.
    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record the duration of an API call.
    ///
    /// `status` is `None` when no response was received.
    pub fn record_request_duration(
        &self,
        path: &str,
        method: &str,
        duration: Duration,
        status: Option<u16>,
    ) {
        if !self.enabled {
            return;
        }

        let status_label = status.map_or("error".to_string(), |s| s.to_string());

        metrics::histogram!(METRIC_REQUEST_DURATION,
            "path" => path.to_string(),
            "method" => method.to_string(),
            "status" => status_label,
        )
        .record(duration.as_secs_f64());
    }

    /// Record an API call attempt, including a re-attempt after 401.
    pub fn record_request(&self, path: &str, method: &str) {
        if !self.enabled {
            return;
        }

        metrics::counter!(METRIC_REQUESTS_TOTAL,
            "path" => path.to_string(),
            "method" => method.to_string(),
        )
        .increment(1);
    }

    /// Record the single re-attempt made after a 401.
    pub fn record_retry(&self, path: &str, method: &str) {
        if !self.enabled {
            return;
        }

        metrics::counter!(METRIC_RETRIES_TOTAL,
            "path" => path.to_string(),
            "method" => method.to_string(),
        )
        .increment(1);
    }

    pub fn record_error(&self, path: &str, method: &str, category: ErrorCategory) {
        if !self.enabled {
            return;
        }

        metrics::counter!(METRIC_ERRORS_TOTAL,
            "path" => path.to_string(),
            "method" => method.to_string(),
            "error_category" => category.as_str(),
        )
        .increment(1);
    }

    /// Record a completed token exchange.
    pub fn record_token_exchange(&self, success: bool) {
        if !self.enabled {
            return;
        }
        let outcome = if success { "success" } else { "failure" };
        metrics::counter!(METRIC_TOKEN_EXCHANGES, "outcome" => outcome).increment(1);
    }

    pub fn record_token_cache_hit(&self) {
        if !self.enabled {
            return;
        }
        metrics::counter!(METRIC_TOKEN_CACHE_HITS).increment(1);
    }

    pub fn record_token_cache_miss(&self) {
        if !self.enabled {
            return;
        }
        metrics::counter!(METRIC_TOKEN_CACHE_MISSES).increment(1);
    }
}
