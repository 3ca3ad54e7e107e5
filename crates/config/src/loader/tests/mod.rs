//! Tests for the configuration loader builder.
//!
//! Invariants:
//! - Tests use `serial_test` to prevent environment variable pollution.
//! - Tests use `global_test_lock()` for additional synchronization.
//! - Temporary directories are cleaned up automatically via `tempfile`.

use std::sync::Mutex;


/// Returns the global test lock for environment variable isolation.
pub fn env_lock() -> &'static Mutex<()> {
    crate::test_util::global_test_lock()
}

/// Every variable the loader reads, unset; spread into `temp_env::with_vars`.
pub fn cleared_env() -> Vec<(&'static str, Option<&'static str>)> {
    use crate::constants::*;
    vec![
        (ENV_CLIENT_ID, None),
        (ENV_CLIENT_SECRET, None),
        (ENV_TOKEN_URL, None),
        (ENV_API_BASE_URL, None),
        (ENV_ENVIRONMENT, None),
        (ENV_SCOPE, None),
        (ENV_TIMEOUT, None),
        (ENV_RETRY_ON_UNAUTHORIZED, None),
        (ENV_CONFIG_PATH, None),
    ]
}
