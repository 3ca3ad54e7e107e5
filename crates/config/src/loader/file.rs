//! JSON config file loading.
//!
//! Responsibilities:
//! - Read a JSON config file and apply its values to a ConfigLoader instance.
//!
//! Does NOT handle:
//! - Environment variable parsing (see env.rs).
//! - Building the final Config (see builder.rs).
//!
//! Invariants:
//! - File values are applied before environment variables (env vars take precedence).
//! - Every field of the file is optional; a partial file only fills what it names.
//! - A missing file at an explicitly requested path is an error.

use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use super::builder::ConfigLoader;
use super::error::ConfigError;
use crate::types::Environment;

/// On-disk shape; mirrors `Config` with every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    environment: Option<Environment>,
    client_id: Option<String>,
    client_secret: Option<String>,
    token_url: Option<String>,
    api_base_url: Option<String>,
    scope: Option<String>,
    timeout_seconds: Option<u64>,
    retry_on_unauthorized: Option<bool>,
}

/// Apply values from the JSON file at `path` to the loader.
pub fn apply_file(loader: &mut ConfigLoader, path: &Path) -> Result<(), ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ConfigFileRead {
        path: path.to_path_buf(),
        kind: e.kind(),
    })?;

    let file: ConfigFile =
        serde_json::from_str(&content).map_err(|e| ConfigError::ConfigFileParse {
            path: path.to_path_buf(),
            // Line/column only; serde_json messages do not echo values.
            message: format!("line {}, column {}", e.line(), e.column()),
        })?;

    tracing::debug!(path = %path.display(), "Applying config file");

    if let Some(environment) = file.environment {
        loader.set_environment(Some(environment));
    }
    if let Some(id) = file.client_id {
        loader.set_client_id(Some(id));
    }
    if let Some(secret) = file.client_secret {
        loader.set_client_secret(Some(SecretString::new(secret.into())));
    }
    if let Some(url) = file.token_url {
        loader.set_token_url(Some(url));
    }
    if let Some(url) = file.api_base_url {
        loader.set_api_base_url(Some(url));
    }
    if let Some(scope) = file.scope {
        loader.set_scope(Some(scope));
    }
    if let Some(secs) = file.timeout_seconds {
        loader.set_timeout(Some(Duration::from_secs(secs)));
    }
    if let Some(retry) = file.retry_on_unauthorized {
        loader.set_retry_on_unauthorized(Some(retry));
    }

    Ok(())
}
