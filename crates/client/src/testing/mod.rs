//! Testing utilities for the Nuvem Fiscal client.
//!
//! Available when running tests or when the `test-utils` feature is enabled.
//!
//! # Example
//! ```ignore
//! use nuvem_fiscal_client::testing::{ManualClock, token_response};
//!
//! let clock = Arc::new(ManualClock::new(1_700_000_000_000));
//! Mock::given(method("POST"))
//!     .respond_with(ResponseTemplate::new(200).set_body_json(token_response("tok", 3600)))
//!     .mount(&server)
//!     .await;
//! clock.advance_secs(55 * 60);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use secrecy::SecretString;

use crate::auth::{Clock, Credentials};

/// [`Clock`] that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_millis: AtomicI64,
}

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        Self {
            now_millis: AtomicI64::new(start_millis),
        }
    }

    pub fn shared(start_millis: i64) -> Arc<Self> {
        Arc::new(Self::new(start_millis))
    }

    pub fn set_millis(&self, millis: i64) {
        self.now_millis.store(millis, Ordering::SeqCst);
    }

    pub fn advance_millis(&self, millis: i64) {
        self.now_millis.fetch_add(millis, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance_millis(secs * 1000);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now_millis.load(Ordering::SeqCst)
    }
}

/// Token endpoint success body.
pub fn token_response(access_token: &str, expires_in: u64) -> serde_json::Value {
    serde_json::json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_in": expires_in,
        "scope": crate::DEFAULT_SCOPE,
    })
}

/// Credentials pointing both endpoints at a mock server root.
pub fn mock_credentials(server_uri: &str) -> Credentials {
    Credentials::new(
        "test-client-id",
        SecretString::from("test-client-secret".to_string()),
        format!("{server_uri}/oauth/token"),
        server_uri,
    )
}
