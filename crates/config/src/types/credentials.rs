//! OAuth2 client credentials for the Nuvem Fiscal API.
//!
//! Responsibilities:
//! - Hold the client-credentials pair plus the token and API endpoints.
//! - Select default endpoints for the production or sandbox environment.
//! - Handle serialization of secret values.
//!
//! Does NOT handle:
//! - The token exchange itself or token caching (see client crate).
//!
//! Invariants:
//! - `client_secret` is a `secrecy::SecretString` and never appears in `Debug` output.
//! - Serialization includes the secret for config file persistence; secrecy is for runtime safety.

use std::fmt;
use std::str::FromStr;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_SCOPE, DEFAULT_TOKEN_URL, PRODUCTION_API_BASE_URL, SANDBOX_API_BASE_URL,
};

/// Module for serializing SecretString as strings.
pub(crate) mod secret_string {
    use secrecy::{ExposeSecret, SecretString};
    use serde::{Deserialize as DeserializeTrait, Serialize as SerializeTrait};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        secret.expose_secret().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(SecretString::new(s.into()))
    }
}

/// Nuvem Fiscal deployment the credentials belong to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Sandbox,
}

impl Environment {
    /// Default API root for this environment.
    pub const fn api_base_url(self) -> &'static str {
        match self {
            Self::Production => PRODUCTION_API_BASE_URL,
            Self::Sandbox => SANDBOX_API_BASE_URL,
        }
    }

    /// Token endpoint for this environment (shared by both today).
    pub const fn token_url(self) -> &'static str {
        DEFAULT_TOKEN_URL
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Sandbox => "sandbox",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "sandbox" | "homologacao" => Ok(Self::Sandbox),
            other => Err(format!(
                "unknown environment '{other}' (expected production or sandbox)"
            )),
        }
    }
}

/// Client-credentials configuration, immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// OAuth2 client identifier.
    pub client_id: String,
    /// OAuth2 client secret.
    #[serde(with = "secret_string")]
    pub client_secret: SecretString,
    /// Token endpoint URL.
    pub token_url: String,
    /// API root URL; request paths are appended to it.
    pub api_base_url: String,
    /// Space-separated scope requested on each exchange.
    #[serde(default = "default_scope")]
    pub scope: String,
}

pub(crate) fn default_scope() -> String {
    DEFAULT_SCOPE.to_string()
}

impl CredentialsConfig {
    /// Credentials targeting the default endpoints of `environment`.
    pub fn for_environment(
        environment: Environment,
        client_id: impl Into<String>,
        client_secret: SecretString,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
            token_url: environment.token_url().to_string(),
            api_base_url: environment.api_base_url().to_string(),
            scope: default_scope(),
        }
    }
}
