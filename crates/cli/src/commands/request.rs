//! Generic JSON request command (`get`, `post`, `put`, `delete`).

use anyhow::{Context, Result};
use nuvem_fiscal_client::{Method, QueryParams};
use nuvem_fiscal_config::Config;
use serde_json::Value;
use tracing::warn;

use crate::args::RequestArgs;
use crate::cancellation::CancellationToken;
use crate::commands::{build_client_from_config, finish, request_options};

pub async fn run(
    method: Method,
    args: RequestArgs,
    config: &Config,
    cancel: &CancellationToken,
) -> Result<()> {
    let body = read_body(&args)?;
    if method == Method::GET && body.is_some() {
        warn!("Request body is ignored for GET requests");
    }

    let query: QueryParams = args.query.into_iter().map(|(k, v)| (k, Some(v))).collect();
    let query = (!query.is_empty()).then_some(&query);

    let client = build_client_from_config(config)?;
    let result = client
        .request_with::<Value, Value>(
            method,
            &args.path,
            body.as_ref(),
            query,
            &request_options(cancel),
        )
        .await;

    finish(result, cancel)
}

fn read_body(args: &RequestArgs) -> Result<Option<Value>> {
    let raw = match (&args.body, &args.body_file) {
        (Some(inline), _) => inline.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read body file {}", path.display()))?,
        (None, None) => return Ok(None),
    };
    let value = serde_json::from_str(&raw).context("Request body is not valid JSON")?;
    Ok(Some(value))
}
