//! Common test utilities for integration tests.
//!
//! Every test starts its own `MockServer` that plays both the token endpoint
//! (`POST /oauth/token`) and the API root.
//!
//! # Invariants
//! - Token mocks are mounted with an explicit `expect(..)` so exchange counts
//!   are verified when the server drops.
//! - Clocks are [`ManualClock`]s; no test sleeps to expire a token.

use std::sync::Arc;

#[allow(unused_imports)]
pub use nuvem_fiscal_client::testing::{ManualClock, mock_credentials, token_response};
#[allow(unused_imports)]
pub use nuvem_fiscal_client::{
    ApiError, ErrorCategory, FiscalClient, RequestOptions, TokenCache, TokenState,
};
#[allow(unused_imports)]
pub use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use wiremock::Match;
use wiremock::matchers::{method, path};

/// 2023-11-14T22:13:20Z, an arbitrary fixed start for manual clocks.
#[allow(dead_code)]
pub const T0: i64 = 1_700_000_000_000;

pub const TOKEN_PATH: &str = "/oauth/token";

/// Mount a token endpoint answering `access_token` and expecting `calls` exchanges.
#[allow(dead_code)]
pub async fn mount_token(server: &MockServer, access_token: &str, expires_in: u64, calls: u64) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_response(access_token, expires_in)))
        .expect(calls)
        .mount(server)
        .await;
}

/// Like [`mount_token`] but only answers `times` requests, so a later mount can
/// take over with a different token.
#[allow(dead_code)]
pub async fn mount_token_times(server: &MockServer, access_token: &str, expires_in: u64, times: u64) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_response(access_token, expires_in)))
        .up_to_n_times(times)
        .expect(times)
        .mount(server)
        .await;
}

/// A cold cache for `server` driven by `clock`.
#[allow(dead_code)]
pub fn token_cache(server: &MockServer, clock: Arc<ManualClock>) -> TokenCache {
    TokenCache::new(mock_credentials(&server.uri()), reqwest::Client::new()).with_clock(clock)
}

/// A client for `server` with a system clock.
#[allow(dead_code)]
pub fn client(server: &MockServer) -> FiscalClient {
    FiscalClient::builder()
        .credentials(mock_credentials(&server.uri()))
        .build()
        .expect("client should build")
}

/// A client for `server` driven by `clock`.
#[allow(dead_code)]
pub fn client_with_clock(server: &MockServer, clock: Arc<ManualClock>) -> FiscalClient {
    FiscalClient::builder()
        .credentials(mock_credentials(&server.uri()))
        .clock(clock)
        .build()
        .expect("client should build")
}

/// Matches requests that carry no `Content-Type` header.
#[allow(dead_code)]
pub struct NoContentType;

impl Match for NoContentType {
    fn matches(&self, request: &Request) -> bool {
        !request.headers.contains_key("content-type")
    }
}

/// Matches requests whose `Content-Type` starts with `prefix`.
#[allow(dead_code)]
pub struct ContentTypePrefix(pub &'static str);

impl Match for ContentTypePrefix {
    fn matches(&self, request: &Request) -> bool {
        request
            .headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with(self.0))
    }
}
