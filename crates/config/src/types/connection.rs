//! Connection configuration types.
//!
//! Responsibilities:
//! - Define connection settings (timeouts, re-authentication policy).
//! - Define the main `Config` structure combining credentials and connection.
//! - Provide serialization helpers for `Duration`.
//!
//! Does NOT handle:
//! - Configuration loading from files/env (see `loader` module).
//! - Actual network connections (see client crate).
//!
//! Invariants:
//! - All duration fields are serialized as seconds (integers).
//! - Default values are provided via `Default` impl, not magic numbers.

use crate::constants::DEFAULT_TIMEOUT_SECS;
use crate::types::credentials::CredentialsConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Module for serializing Duration as seconds (integer).
mod duration_seconds {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

/// HTTP behaviour shared by the token exchange and API calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Per-request timeout (serialized as seconds)
    #[serde(with = "duration_seconds", default = "default_timeout")]
    pub timeout: Duration,
    /// Re-attempt a request once after a 401 invalidated the cached token.
    /// Default: false
    #[serde(default)]
    pub retry_on_unauthorized: bool,
}

pub(crate) fn default_timeout() -> Duration {
    Duration::from_secs(DEFAULT_TIMEOUT_SECS)
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            retry_on_unauthorized: false,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// OAuth2 credentials and endpoints
    pub credentials: CredentialsConfig,
    /// Connection settings
    #[serde(default)]
    pub connection: ConnectionConfig,
}

impl Config {
    /// Create a config from credentials with default connection settings.
    pub fn with_credentials(credentials: CredentialsConfig) -> Self {
        Self {
            credentials,
            connection: ConnectionConfig::default(),
        }
    }
}
