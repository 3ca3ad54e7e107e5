//! Nuvem Fiscal REST API client.
//!
//! This crate provides an OAuth2 client-credentials [`TokenCache`] and an
//! authenticated [`FiscalClient`] that attaches the cached bearer token to
//! every call and classifies failures into [`ErrorCategory`] values.

mod auth;
pub mod cancellation;
pub mod client;
mod endpoints;
pub mod error;
pub mod metrics;
mod query;
pub mod tracing;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use auth::{Clock, Credentials, SystemClock, TokenCache, TokenState};
pub use cancellation::CancellationToken;
pub use client::builder::FiscalClientBuilder;
pub use client::{FiscalClient, RequestOptions};
pub use error::{
    ApiError, ApiResponse, ClientError, ErrorCategory, ErrorDetails, RequestResult, Result,
    TokenError,
};
pub use metrics::MetricsCollector;
pub use nuvem_fiscal_config::constants::DEFAULT_SCOPE;
pub use query::QueryParams;
pub use reqwest::Method;
