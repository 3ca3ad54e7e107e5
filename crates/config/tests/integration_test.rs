//! Integration tests for configuration loading through the public API.
//!
//! These tests verify end-to-end config loading behavior, ensuring that
//! the ConfigLoader builder chain works the way the CLI drives it:
//! config file < environment variables < explicit overrides.

use nuvem_fiscal_config::constants::{
    DEFAULT_SCOPE, DEFAULT_TIMEOUT_SECS, DEFAULT_TOKEN_URL, ENV_API_BASE_URL, ENV_CLIENT_ID,
    ENV_CLIENT_SECRET, ENV_CONFIG_PATH, ENV_ENVIRONMENT, ENV_RETRY_ON_UNAUTHORIZED, ENV_SCOPE,
    ENV_TIMEOUT, ENV_TOKEN_URL, PRODUCTION_API_BASE_URL, SANDBOX_API_BASE_URL,
};
use nuvem_fiscal_config::{ConfigError, ConfigLoader, Environment, env_var_or_none};
use secrecy::ExposeSecret;
use serial_test::serial;
use std::time::Duration;
use tempfile::TempDir;

fn cleared_env() -> Vec<(&'static str, Option<&'static str>)> {
    [
        ENV_CLIENT_ID,
        ENV_CLIENT_SECRET,
        ENV_TOKEN_URL,
        ENV_API_BASE_URL,
        ENV_ENVIRONMENT,
        ENV_SCOPE,
        ENV_TIMEOUT,
        ENV_RETRY_ON_UNAUTHORIZED,
        ENV_CONFIG_PATH,
    ]
    .into_iter()
    .map(|key| (key, None))
    .collect()
}

fn with_env<F: FnOnce()>(overrides: &[(&'static str, &'static str)], f: F) {
    let mut vars = cleared_env();
    for &(key, value) in overrides {
        vars.retain(|&(k, _)| k != key);
        vars.push((key, Some(value)));
    }
    temp_env::with_vars(vars, f);
}

#[test]
#[serial]
fn test_full_precedence_chain() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nuvem-fiscal.json");
    std::fs::write(
        &path,
        r#"{
            "environment": "sandbox",
            "client_id": "file-id",
            "client_secret": "file-secret",
            "scope": "empresa",
            "timeout_seconds": 10
        }"#,
    )
    .unwrap();

    with_env(
        &[(ENV_CLIENT_ID, "env-id"), (ENV_TIMEOUT, "20")],
        || {
            let config = ConfigLoader::new()
                .with_config_path(path.clone())
                .from_file()
                .unwrap()
                .from_env()
                .unwrap()
                .with_timeout(Duration::from_secs(45))
                .build()
                .unwrap();

            // file
            assert_eq!(config.credentials.client_secret.expose_secret(), "file-secret");
            assert_eq!(config.credentials.scope, "empresa");
            assert_eq!(config.credentials.api_base_url, SANDBOX_API_BASE_URL);
            // env over file
            assert_eq!(config.credentials.client_id, "env-id");
            // override over env
            assert_eq!(config.connection.timeout, Duration::from_secs(45));
        },
    );
}

#[test]
#[serial]
fn test_defaults_from_env_only() {
    with_env(
        &[(ENV_CLIENT_ID, "id"), (ENV_CLIENT_SECRET, "secret")],
        || {
            let config = ConfigLoader::new().from_env().unwrap().build().unwrap();

            assert_eq!(config.credentials.token_url, DEFAULT_TOKEN_URL);
            assert_eq!(config.credentials.api_base_url, PRODUCTION_API_BASE_URL);
            assert_eq!(config.credentials.scope, DEFAULT_SCOPE);
            assert_eq!(
                config.connection.timeout,
                Duration::from_secs(DEFAULT_TIMEOUT_SECS)
            );
            assert!(!config.connection.retry_on_unauthorized);
        },
    );
}

#[test]
#[serial]
fn test_missing_credentials_reported() {
    with_env(&[], || {
        let err = ConfigLoader::new().from_env().unwrap().build().unwrap_err();
        assert!(matches!(err, ConfigError::MissingClientId));
    });
}

#[test]
#[serial]
fn test_env_var_or_none_is_exported() {
    with_env(&[(ENV_SCOPE, "   ")], || {
        assert_eq!(env_var_or_none(ENV_SCOPE), None);
    });
}

#[test]
fn test_environment_parses_from_cli_strings() {
    assert_eq!("sandbox".parse::<Environment>(), Ok(Environment::Sandbox));
    assert_eq!("PRODUCTION".parse::<Environment>(), Ok(Environment::Production));
    assert!("staging".parse::<Environment>().is_err());
}
