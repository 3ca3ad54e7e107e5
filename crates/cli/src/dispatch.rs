//! Command dispatch logic.
//!
//! Responsibilities:
//! - Route parsed CLI arguments to appropriate command handlers.
//!
//! Does NOT handle:
//! - CLI structure definitions (see `args` module).
//! - Configuration loading (see `main()`).
//!
//! Invariants:
//! - All commands receive the process-wide cancellation token.

use anyhow::Result;
use nuvem_fiscal_client::Method;
use nuvem_fiscal_config::Config;

use crate::args::{Cli, Commands};
use crate::cancellation::CancellationToken;
use crate::commands;

/// Dispatch CLI commands to their respective handlers.
pub(crate) async fn run_command(
    cli: Cli,
    config: Config,
    cancel_token: &CancellationToken,
) -> Result<()> {
    match cli.command {
        Commands::Token { show } => commands::token::run(show, &config, cancel_token).await,
        Commands::Get(args) => {
            commands::request::run(Method::GET, args, &config, cancel_token).await
        }
        Commands::Post(args) => {
            commands::request::run(Method::POST, args, &config, cancel_token).await
        }
        Commands::Put(args) => {
            commands::request::run(Method::PUT, args, &config, cancel_token).await
        }
        Commands::Delete(args) => {
            commands::request::run(Method::DELETE, args, &config, cancel_token).await
        }
        Commands::Upload { path, file, fields } => {
            commands::upload::run(&path, &file, &fields, &config, cancel_token).await
        }
    }
}
