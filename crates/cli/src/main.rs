//! Nuvem Fiscal CLI - Command-line interface for the Nuvem Fiscal API.
//!
//! Responsibilities:
//! - Parse command-line arguments and environment variables.
//! - Build the configuration and the authenticated client.
//! - Print API responses as JSON and map failures to structured exit codes.
//!
//! Does NOT handle:
//! - Token caching or error classification (see `crates/client`).
//!
//! Invariants:
//! - `load_dotenv()` is called BEFORE CLI parsing to allow `.env` to provide clap defaults.
//! - Configuration precedence: config file < environment < command-line flags.

mod args;
mod cancellation;
mod commands;
mod dispatch;
mod error;

use std::time::Duration;

use args::Cli;
use cancellation::{CancellationToken, is_cancelled_error, print_cancelled_message};
use clap::Parser;
use dispatch::run_command;
use error::{ExitCode, ExitCodeExt, print_error};
use nuvem_fiscal_client::tracing::TracingConfig;
use nuvem_fiscal_config::{Config, ConfigError, ConfigLoader};

#[tokio::main]
async fn main() {
    // Load .env file BEFORE CLI parsing so clap env defaults can read .env values
    if let Err(e) = ConfigLoader::new().load_dotenv() {
        eprintln!("Failed to load environment: {}", e);
        std::process::exit(ExitCode::GeneralError.as_i32());
    }

    let cli = Cli::parse();

    let mut tracing_config = TracingConfig::new()
        .with_service_name("nfiscal")
        .with_service_version(env!("CARGO_PKG_VERSION"))
        .with_default_filter("warn");
    if let Some(ref endpoint) = cli.otlp_endpoint {
        tracing_config = tracing_config.with_otlp_endpoint(endpoint.clone());
    }
    let tracing_guard = match tracing_config.init() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize tracing: {}", e);
            std::process::exit(ExitCode::GeneralError.as_i32());
        }
    };

    let config = match build_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to build configuration: {:#}", e);
            tracing_guard.shutdown();
            std::process::exit(ExitCode::GeneralError.as_i32());
        }
    };

    // Create cancellation token and set up signal handling
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        cancel_clone.cancel();
    });

    let exit_code = match run_command(cli, config, &cancel).await {
        Ok(()) => ExitCode::Success,
        Err(e) if is_cancelled_error(&e) => {
            print_cancelled_message();
            ExitCode::Interrupted
        }
        Err(e) => {
            print_error(&e);
            e.exit_code()
        }
    };

    // Shutdown tracing to ensure all spans are flushed
    tracing_guard.shutdown();

    std::process::exit(exit_code.as_i32());
}

/// Merge the config file, environment variables and CLI flags, in that order.
fn build_config(cli: &Cli) -> Result<Config, ConfigError> {
    let mut loader = ConfigLoader::new();

    if let Some(ref path) = cli.config_path
        && !path.to_string_lossy().trim().is_empty()
    {
        loader = loader.with_config_path(path.clone());
    }

    loader = loader.from_file()?.from_env()?;

    if let Some(environment) = cli.environment {
        loader = loader.with_environment(environment);
    }
    if let Some(ref id) = cli.client_id {
        loader = loader.with_client_id(id.clone());
    }
    if let Some(ref secret) = cli.client_secret {
        loader = loader.with_client_secret(secret.clone());
    }
    if let Some(ref url) = cli.token_url {
        loader = loader.with_token_url(url.clone());
    }
    if let Some(ref url) = cli.api_base_url {
        loader = loader.with_api_base_url(url.clone());
    }
    if let Some(ref scope) = cli.scope {
        loader = loader.with_scope(scope.clone());
    }
    if let Some(timeout_secs) = cli.timeout {
        loader = loader.with_timeout(Duration::from_secs(timeout_secs));
    }
    if cli.retry_on_unauthorized {
        loader = loader.with_retry_on_unauthorized(true);
    }

    loader.build()
}
