//! Centralized constants for the Nuvem Fiscal workspace.
//!
//! This module contains default values used across crates to avoid
//! magic number duplication.

// =============================================================================
// Endpoints
// =============================================================================

/// OAuth2 token endpoint shared by production and sandbox.
pub const DEFAULT_TOKEN_URL: &str = "https://auth.nuvemfiscal.com.br/oauth/token";

/// Production API root.
pub const PRODUCTION_API_BASE_URL: &str = "https://api.nuvemfiscal.com.br";

/// Sandbox API root.
pub const SANDBOX_API_BASE_URL: &str = "https://api.sandbox.nuvemfiscal.com.br";

/// Scope requested on every client-credentials exchange.
pub const DEFAULT_SCOPE: &str = "empresa cep cnpj nfe nfce nfse cte mdfe conta";

// =============================================================================
// Connection & Timeout Defaults
// =============================================================================

/// Default HTTP request timeout in seconds.
///
/// Applies to both the token exchange and the API call.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum allowed request timeout in seconds (1 hour).
pub const MAX_TIMEOUT_SECS: u64 = 3600;

/// Seconds subtracted from the server-reported `expires_in` before a token is
/// considered expired.
pub const TOKEN_SAFETY_MARGIN_SECS: u64 = 300;

/// Default maximum number of HTTP redirects to follow.
pub const DEFAULT_MAX_REDIRECTS: usize = 5;

// =============================================================================
// Environment variable names
// =============================================================================

pub const ENV_CLIENT_ID: &str = "NUVEM_FISCAL_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "NUVEM_FISCAL_CLIENT_SECRET";
pub const ENV_TOKEN_URL: &str = "NUVEM_FISCAL_TOKEN_URL";
pub const ENV_API_BASE_URL: &str = "NUVEM_FISCAL_API_BASE_URL";
pub const ENV_ENVIRONMENT: &str = "NUVEM_FISCAL_ENVIRONMENT";
pub const ENV_SCOPE: &str = "NUVEM_FISCAL_SCOPE";
pub const ENV_TIMEOUT: &str = "NUVEM_FISCAL_TIMEOUT";
pub const ENV_RETRY_ON_UNAUTHORIZED: &str = "NUVEM_FISCAL_RETRY_ON_UNAUTHORIZED";
pub const ENV_CONFIG_PATH: &str = "NUVEM_FISCAL_CONFIG_PATH";
pub const ENV_OTLP_ENDPOINT: &str = "NUVEM_FISCAL_OTLP_ENDPOINT";
