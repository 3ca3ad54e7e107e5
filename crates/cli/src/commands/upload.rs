//! Multipart upload command.

use anyhow::{Context, Result};
use nuvem_fiscal_config::Config;
use serde_json::Value;
use std::path::Path;

use crate::cancellation::CancellationToken;
use crate::commands::{build_client_from_config, finish, request_options};

pub async fn run(
    path: &str,
    file: &Path,
    fields: &[(String, String)],
    config: &Config,
    cancel: &CancellationToken,
) -> Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let file_name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", file.display()))?;
    let fields: Vec<(&str, &str)> = fields
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    let client = build_client_from_config(config)?;
    let result = client
        .upload_file_with::<Value>(path, bytes, &file_name, &fields, &request_options(cancel))
        .await;

    finish(result, cancel)
}
