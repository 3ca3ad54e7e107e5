//! Environment variable parsing for configuration.
//!
//! Responsibilities:
//! - Read and parse `NUVEM_FISCAL_*` environment variables.
//! - Apply environment variable values to a ConfigLoader instance.
//! - Provide helper functions for reading env vars with empty/whitespace filtering.
//!
//! Does NOT handle:
//! - Loading from config files (see file.rs).
//! - Building the final Config (see builder.rs).
//! - .env file loading (handled by ConfigLoader::load_dotenv).
//!
//! Invariants:
//! - Environment variables take precedence over config file settings.
//! - Empty or whitespace-only environment variables are treated as unset.
//! - Returned values are trimmed (leading/trailing whitespace removed).
//! - Invalid values return ConfigError::InvalidValue.

use secrecy::SecretString;
use std::time::Duration;

use super::builder::ConfigLoader;
use super::error::ConfigError;
use crate::constants::{
    ENV_API_BASE_URL, ENV_CLIENT_ID, ENV_CLIENT_SECRET, ENV_CONFIG_PATH, ENV_ENVIRONMENT,
    ENV_RETRY_ON_UNAUTHORIZED, ENV_SCOPE, ENV_TIMEOUT, ENV_TOKEN_URL,
};
use crate::types::Environment;

/// Read an environment variable, returning None if unset, empty, or whitespace-only.
/// Returns the trimmed value (leading/trailing whitespace removed) if present.
pub fn env_var_or_none(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == s.len() {
            Some(s)
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn parse_bool(var: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var: var.to_string(),
            message: "must be true or false".to_string(),
        }),
    }
}

/// Apply environment variable configuration to the loader.
pub fn apply_env(loader: &mut ConfigLoader) -> Result<(), ConfigError> {
    if let Some(env) = env_var_or_none(ENV_ENVIRONMENT) {
        let environment = env
            .parse::<Environment>()
            .map_err(|message| ConfigError::InvalidValue {
                var: ENV_ENVIRONMENT.to_string(),
                message,
            })?;
        loader.set_environment(Some(environment));
    }
    if let Some(id) = env_var_or_none(ENV_CLIENT_ID) {
        loader.set_client_id(Some(id));
    }
    if let Some(secret) = env_var_or_none(ENV_CLIENT_SECRET) {
        loader.set_client_secret(Some(SecretString::new(secret.into())));
    }
    if let Some(url) = env_var_or_none(ENV_TOKEN_URL) {
        loader.set_token_url(Some(url));
    }
    if let Some(url) = env_var_or_none(ENV_API_BASE_URL) {
        loader.set_api_base_url(Some(url));
    }
    if let Some(scope) = env_var_or_none(ENV_SCOPE) {
        loader.set_scope(Some(scope));
    }
    if let Some(timeout) = env_var_or_none(ENV_TIMEOUT) {
        let secs: u64 = timeout.parse().map_err(|_| ConfigError::InvalidValue {
            var: ENV_TIMEOUT.to_string(),
            message: "must be a number".to_string(),
        })?;
        loader.set_timeout(Some(Duration::from_secs(secs)));
    }
    if let Some(retry) = env_var_or_none(ENV_RETRY_ON_UNAUTHORIZED) {
        loader.set_retry_on_unauthorized(Some(parse_bool(ENV_RETRY_ON_UNAUTHORIZED, &retry)?));
    }

    // Config path from environment (only if not already set explicitly)
    if loader.config_path().is_none()
        && let Some(config_path) = env_var_or_none(ENV_CONFIG_PATH)
    {
        loader.set_config_path(Some(std::path::PathBuf::from(config_path)));
    }

    Ok(())
}
