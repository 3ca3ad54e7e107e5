//! Configuration management for the Nuvem Fiscal client.
//!
//! This crate provides types and loaders for the OAuth2 client credentials
//! and connection settings, read from environment variables, `.env` files,
//! and a JSON config file.

pub mod constants;
mod loader;
pub mod types;

pub use loader::{ConfigError, ConfigLoader, env_var_or_none};
pub use types::{Config, ConnectionConfig, CredentialsConfig, Environment};
