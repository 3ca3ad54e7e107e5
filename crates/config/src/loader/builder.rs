//! Configuration loader builder implementation.
//!
//! Responsibilities:
//! - Provide a builder-pattern `ConfigLoader` for hierarchical configuration merging.
//! - Support loading from a JSON config file, environment variables, and direct builder methods.
//! - Validate and build the final `Config`.
//!
//! Does NOT handle:
//! - Direct environment variable parsing logic (delegated to env.rs).
//! - Config file parsing (delegated to file.rs).
//!
//! Invariants / Assumptions:
//! - Precedence: defaults < config file < environment variables < builder methods,
//!   provided callers apply sources in that order (`from_file`, `from_env`, `with_*`).
//! - Explicit token/API URLs win over the URLs implied by `environment`.
//! - `load_dotenv()` must be called explicitly to enable `.env` file loading.
//! - The `DOTENV_DISABLED` variable is checked before `dotenvy::dotenv()` is called.

use secrecy::{ExposeSecret, SecretString};
use std::path::PathBuf;
use std::time::Duration;

use super::env::apply_env;
use super::error::ConfigError;
use super::file::apply_file;
use crate::constants::{DEFAULT_SCOPE, DEFAULT_TIMEOUT_SECS, MAX_TIMEOUT_SECS};
use crate::types::{Config, ConnectionConfig, CredentialsConfig, Environment};

/// Configuration loader that builds config from files and environment variables.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    environment: Option<Environment>,
    client_id: Option<String>,
    client_secret: Option<SecretString>,
    token_url: Option<String>,
    api_base_url: Option<String>,
    scope: Option<String>,
    timeout: Option<Duration>,
    retry_on_unauthorized: Option<bool>,
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if dotenv loading is disabled via environment variable.
    fn dotenv_disabled() -> bool {
        matches!(
            std::env::var("DOTENV_DISABLED").ok().as_deref(),
            Some("true") | Some("1")
        )
    }

    /// Load environment variables from .env file if present.
    ///
    /// If `DOTENV_DISABLED` environment variable is set to "true" or "1",
    /// the .env file will not be loaded (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The `.env` file exists but has invalid syntax (`ConfigError::DotenvParse`)
    /// - The `.env` file exists but cannot be read due to I/O errors (`ConfigError::DotenvIo`)
    ///
    /// Missing `.env` files are silently ignored (returns `Ok(self)`).
    pub fn load_dotenv(self) -> Result<Self, ConfigError> {
        if Self::dotenv_disabled() {
            return Ok(self);
        }

        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if Self::is_not_found(&e) => Ok(self),
            Err(dotenvy::Error::LineParse(_, idx)) => {
                Err(ConfigError::DotenvParse { error_index: idx })
            }
            Err(dotenvy::Error::Io(io_err)) => Err(ConfigError::DotenvIo {
                kind: io_err.kind(),
            }),
            Err(_) => Err(ConfigError::DotenvUnknown),
        }
    }

    /// Check if a dotenv error indicates the file was not found.
    fn is_not_found(err: &dotenvy::Error) -> bool {
        matches!(
            err,
            dotenvy::Error::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound
        )
    }

    /// Set the JSON config file to read in `from_file`.
    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    /// Read configuration from the config file, if a path was set.
    ///
    /// Without a path (neither `with_config_path` nor `NUVEM_FISCAL_CONFIG_PATH`
    /// applied through `from_env`) this is a no-op.
    pub fn from_file(mut self) -> Result<Self, ConfigError> {
        if let Some(path) = self.config_path.clone() {
            apply_file(&mut self, &path)?;
        }
        Ok(self)
    }

    /// Read configuration from environment variables.
    pub fn from_env(mut self) -> Result<Self, ConfigError> {
        apply_env(&mut self)?;
        Ok(self)
    }

    /// Select the Nuvem Fiscal environment (determines default URLs).
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Set the OAuth2 client ID.
    pub fn with_client_id(mut self, id: String) -> Self {
        self.client_id = Some(id);
        self
    }

    /// Set the OAuth2 client secret.
    pub fn with_client_secret(mut self, secret: String) -> Self {
        self.client_secret = Some(SecretString::new(secret.into()));
        self
    }

    /// Override the token endpoint URL.
    pub fn with_token_url(mut self, url: String) -> Self {
        self.token_url = Some(url);
        self
    }

    /// Override the API root URL.
    pub fn with_api_base_url(mut self, url: String) -> Self {
        self.api_base_url = Some(url);
        self
    }

    /// Override the requested scope.
    pub fn with_scope(mut self, scope: String) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Enable or disable the single re-attempt after a 401.
    pub fn with_retry_on_unauthorized(mut self, retry: bool) -> Self {
        self.retry_on_unauthorized = Some(retry);
        self
    }

    /// Build the final configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the client ID or secret is missing, a URL is
    /// malformed, or the timeout is out of range.
    pub fn build(self) -> Result<Config, ConfigError> {
        let environment = self.environment.unwrap_or_default();

        let client_id = self
            .client_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or(ConfigError::MissingClientId)?;

        let client_secret = self
            .client_secret
            .filter(|secret| !secret.expose_secret().trim().is_empty())
            .ok_or(ConfigError::MissingClientSecret)?;

        let token_url = validate_and_normalize_url(
            "token_url",
            self.token_url
                .as_deref()
                .unwrap_or_else(|| environment.token_url()),
        )?;
        let api_base_url = validate_and_normalize_url(
            "api_base_url",
            self.api_base_url
                .as_deref()
                .unwrap_or_else(|| environment.api_base_url()),
        )?;

        let scope = self
            .scope
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SCOPE.to_string());

        let connection = ConnectionConfig {
            timeout: self
                .timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            retry_on_unauthorized: self.retry_on_unauthorized.unwrap_or(false),
        };
        Self::validate_connection(&connection)?;

        Ok(Config {
            credentials: CredentialsConfig {
                client_id,
                client_secret,
                token_url,
                api_base_url,
                scope,
            },
            connection,
        })
    }

    fn validate_connection(connection: &ConnectionConfig) -> Result<(), ConfigError> {
        let timeout_secs = connection.timeout.as_secs();

        if timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout {
                message: "timeout must be greater than 0 seconds".to_string(),
            });
        }

        if timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::InvalidTimeout {
                message: format!(
                    "timeout exceeds maximum allowed value of {} seconds",
                    MAX_TIMEOUT_SECS
                ),
            });
        }

        Ok(())
    }

    pub(crate) fn config_path(&self) -> Option<&PathBuf> {
        self.config_path.as_ref()
    }

    pub(crate) fn set_config_path(&mut self, path: Option<PathBuf>) {
        self.config_path = path;
    }

    pub(crate) fn set_environment(&mut self, environment: Option<Environment>) {
        self.environment = environment;
    }

    pub(crate) fn set_client_id(&mut self, id: Option<String>) {
        self.client_id = id;
    }

    pub(crate) fn set_client_secret(&mut self, secret: Option<SecretString>) {
        self.client_secret = secret;
    }

    pub(crate) fn set_token_url(&mut self, url: Option<String>) {
        self.token_url = url;
    }

    pub(crate) fn set_api_base_url(&mut self, url: Option<String>) {
        self.api_base_url = url;
    }

    pub(crate) fn set_scope(&mut self, scope: Option<String>) {
        self.scope = scope;
    }

    pub(crate) fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    pub(crate) fn set_retry_on_unauthorized(&mut self, retry: Option<bool>) {
        self.retry_on_unauthorized = retry;
    }
}

/// Validates and normalizes an endpoint URL.
///
/// Validation rules:
/// - Trim surrounding whitespace
/// - Parse as an absolute URL with an http or https scheme and a host
/// - Normalize by stripping trailing slashes
fn validate_and_normalize_url(var: &str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();

    let parsed = url::Url::parse(trimmed).map_err(|e| ConfigError::InvalidValue {
        var: var.into(),
        message: format!("must be an absolute http(s) URL with a host: {e}"),
    })?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(ConfigError::InvalidValue {
            var: var.into(),
            message: format!("scheme must be http or https, got: {scheme}"),
        });
    }

    if parsed.host_str().is_none() {
        return Err(ConfigError::InvalidValue {
            var: var.into(),
            message: "host is required".into(),
        });
    }

    Ok(parsed.as_str().trim_end_matches('/').to_string())
}
