//! Shared test utilities for nfiscal integration tests.
//!
//! Responsibilities:
//! - Provide a hermetic CLI command factory that prevents dotenv loading.
//! - Point the CLI at a wiremock server standing in for both the token
//!   endpoint and the API.
//!
//! Invariants / Assumptions:
//! - All integration tests using this helper will be hermetic by default.
//! - Every `NUVEM_FISCAL_*` variable from the host is cleared.

#![allow(dead_code)]

use assert_cmd::Command;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN_PATH: &str = "/oauth/token";
pub const CLIENT_ID: &str = "cli-client-id";
pub const CLIENT_SECRET: &str = "cli-client-secret";

const NUVEM_FISCAL_VARS: &[&str] = &[
    "NUVEM_FISCAL_CLIENT_ID",
    "NUVEM_FISCAL_CLIENT_SECRET",
    "NUVEM_FISCAL_TOKEN_URL",
    "NUVEM_FISCAL_API_BASE_URL",
    "NUVEM_FISCAL_ENVIRONMENT",
    "NUVEM_FISCAL_SCOPE",
    "NUVEM_FISCAL_TIMEOUT",
    "NUVEM_FISCAL_RETRY_ON_UNAUTHORIZED",
    "NUVEM_FISCAL_CONFIG_PATH",
    "NUVEM_FISCAL_OTLP_ENDPOINT",
];

/// Returns a hermetic `nfiscal` command for integration testing.
///
/// It ensures:
/// - `DOTENV_DISABLED=1` is set to prevent local `.env` contamination.
/// - `NUVEM_FISCAL_*` variables are cleared to ensure no leakage from the host.
pub fn nfiscal_cmd() -> Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("nfiscal");

    // Hermeticity: prevent loading local .env
    cmd.env("DOTENV_DISABLED", "1");
    cmd.env_remove("RUST_LOG");

    for var in NUVEM_FISCAL_VARS {
        cmd.env_remove(var);
    }

    cmd
}

/// Returns a hermetic `nfiscal` command whose token endpoint and API both
/// live on `server_uri`.
pub fn nfiscal_cmd_for(server_uri: &str) -> Command {
    let mut cmd = nfiscal_cmd();
    cmd.env("NUVEM_FISCAL_CLIENT_ID", CLIENT_ID)
        .env("NUVEM_FISCAL_CLIENT_SECRET", CLIENT_SECRET)
        .env("NUVEM_FISCAL_TOKEN_URL", format!("{server_uri}{TOKEN_PATH}"))
        .env("NUVEM_FISCAL_API_BASE_URL", server_uri);
    cmd
}

/// Serve `access_token` from the token endpoint.
pub async fn mount_token(server: &MockServer, access_token: &str) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": access_token,
            "token_type": "bearer",
            "expires_in": 3600,
        })))
        .mount(server)
        .await;
}
