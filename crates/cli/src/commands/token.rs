//! Token command implementation.
//!
//! Performs (or reuses) a client-credentials exchange and reports the
//! cache state. The token itself is printed only with `--show`.

use anyhow::Result;
use nuvem_fiscal_client::TokenState;
use nuvem_fiscal_config::Config;
use serde_json::{Map, Value, json};
use tracing::info;

use crate::cancellation::{CancellationToken, Cancelled};

pub async fn run(show: bool, config: &Config, cancel: &CancellationToken) -> Result<()> {
    let client = crate::commands::build_client_from_config(config)?;
    let cache = client.token_cache();

    info!(token_url = %cache.credentials().token_url, "Requesting access token");

    let token = tokio::select! {
        res = cache.get_token() => res?,
        _ = cancel.cancelled() => return Err(Cancelled.into()),
    };

    let output = describe(
        cache.state(),
        cache.expires_at_millis(),
        &cache.credentials().scope,
        show.then_some(token.as_str()),
    );
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn describe(
    state: TokenState,
    expires_at_millis: Option<i64>,
    scope: &str,
    access_token: Option<&str>,
) -> Value {
    let mut output = Map::new();
    let state = match state {
        TokenState::Warm => "warm",
        TokenState::Cold => "cold",
    };
    output.insert("state".into(), json!(state));
    if let Some(millis) = expires_at_millis {
        output.insert("expires_at_millis".into(), json!(millis));
        if let Some(at) = chrono::DateTime::from_timestamp_millis(millis) {
            output.insert("expires_at".into(), json!(at.to_rfc3339()));
        }
    }
    output.insert("scope".into(), json!(scope));
    if let Some(token) = access_token {
        output.insert("access_token".into(), json!(token));
    }
    Value::Object(output)
}
