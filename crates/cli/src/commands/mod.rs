//! CLI command implementations.

pub mod request;
pub mod token;
pub mod upload;

use anyhow::{Context, Result};
use nuvem_fiscal_client::{ApiResponse, FiscalClient, RequestOptions, RequestResult};
use nuvem_fiscal_config::Config;
use serde_json::Value;

use crate::cancellation::{CancellationToken, Cancelled};

pub fn build_client_from_config(config: &Config) -> Result<FiscalClient> {
    FiscalClient::builder()
        .from_config(config)
        .build()
        .context("Failed to build API client")
}

/// Per-call options that stop the request when Ctrl+C is pressed.
pub(crate) fn request_options(cancel: &CancellationToken) -> RequestOptions {
    RequestOptions::new().with_cancel(cancel.clone())
}

/// Print a successful response, or convert the failure into an `anyhow` error.
///
/// A failure observed after Ctrl+C is reported as [`Cancelled`].
pub(crate) fn finish(result: RequestResult<Value>, cancel: &CancellationToken) -> Result<()> {
    match result {
        Ok(response) => print_response(&response),
        Err(_) if cancel.is_cancelled() => Err(Cancelled.into()),
        Err(e) => Err(e.into()),
    }
}

fn print_response(response: &ApiResponse<Value>) -> Result<()> {
    match &response.data {
        Some(data) => {
            let output =
                serde_json::to_string_pretty(data).context("Failed to format response")?;
            println!("{output}");
        }
        None => eprintln!("HTTP {} (no JSON body)", response.status),
    }
    Ok(())
}
