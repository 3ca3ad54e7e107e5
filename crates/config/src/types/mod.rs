//! Configuration type definitions.
//!
//! Responsibilities:
//! - Define configuration types for credentials and connection settings.
//! - Provide serialization helpers for sensitive types (secrets, durations).
//!
//! Does NOT handle:
//! - Configuration loading from files or environment variables (see `loader` module).
//! - Actual network connections or token exchange (see client crate).
//!
//! Invariants:
//! - All secret types use `secrecy::SecretString` to prevent accidental logging.

pub(crate) mod connection;
pub(crate) mod credentials;

pub use connection::{Config, ConnectionConfig};
pub use credentials::{CredentialsConfig, Environment};
