//! CLI exit codes for scripting and automation.
//!
//! Responsibilities:
//! - Define structured exit codes that scripts can use to distinguish error types.
//! - Map `ErrorCategory`, `ApiError` and `TokenError` to exit codes.
//! - Print failures to stderr with their category and details.
//!
//! Does NOT handle:
//! - Signal handling (see cancellation.rs for SIGINT handling).
//!
//! Invariants:
//! - Exit codes 1-9 are reserved for specific error categories.
//! - Exit code 130 is reserved for SIGINT (Unix standard: 128 + SIGINT).
//! - Error output never includes the access token or client secret.

use nuvem_fiscal_client::{ApiError, ErrorCategory, TokenError};

use crate::cancellation::SIGINT_EXIT_CODE;

/// Structured exit codes for nfiscal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Success - command completed successfully.
    Success = 0,

    /// General error - configuration, usage, or unclassified failure.
    GeneralError = 1,

    /// The API rejected the token, or the token endpoint rejected the credentials.
    ///
    /// Scripts should check the client ID and secret.
    AuthenticationFailed = 2,

    /// Connection error - network, timeout, or DNS failure.
    ///
    /// Scripts may retry with exponential backoff.
    ConnectionError = 3,

    /// Resource not found (HTTP 404).
    NotFound = 4,

    /// The API rejected the payload (HTTP 422).
    ///
    /// Scripts should fix the input and not retry the same request.
    ValidationError = 5,

    /// Rate limited - HTTP 429 Too Many Requests.
    ///
    /// Scripts should back off and retry later.
    RateLimited = 7,

    /// Any other upstream failure (403, 5xx, ...).
    UpstreamError = 8,

    /// Interrupted - SIGINT/Ctrl+C (Unix standard: 128 + 2).
    Interrupted = SIGINT_EXIT_CODE,
}

impl ExitCode {
    /// Convert the exit code to an i32 for use with std::process::exit().
    pub const fn as_i32(self) -> i32 {
        self as u8 as i32
    }

    /// Returns true if this exit code indicates a retryable condition.
    #[allow(dead_code)]
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            ExitCode::ConnectionError | ExitCode::RateLimited | ExitCode::UpstreamError
        )
    }
}

impl From<ErrorCategory> for ExitCode {
    fn from(category: ErrorCategory) -> Self {
        match category {
            ErrorCategory::Unauthorized => ExitCode::AuthenticationFailed,
            ErrorCategory::NotFound => ExitCode::NotFound,
            ErrorCategory::ValidationFailed => ExitCode::ValidationError,
            ErrorCategory::RateLimited => ExitCode::RateLimited,
            ErrorCategory::UpstreamError => ExitCode::UpstreamError,
            ErrorCategory::TransportError => ExitCode::ConnectionError,
        }
    }
}

impl From<&ApiError> for ExitCode {
    fn from(err: &ApiError) -> Self {
        ExitCode::from(err.category)
    }
}

impl From<&TokenError> for ExitCode {
    fn from(err: &TokenError) -> Self {
        match err {
            TokenError::AuthenticationFailed { .. } => ExitCode::AuthenticationFailed,
            TokenError::RateLimited { .. } => ExitCode::RateLimited,
            TokenError::Transport(_) => ExitCode::ConnectionError,
        }
    }
}

/// Extension trait for anyhow::Error to extract exit codes.
pub trait ExitCodeExt {
    /// Extract the appropriate exit code from this error.
    ///
    /// Returns ExitCode::GeneralError if no API or token error is in the chain.
    fn exit_code(&self) -> ExitCode;
}

impl ExitCodeExt for anyhow::Error {
    fn exit_code(&self) -> ExitCode {
        for cause in self.chain() {
            if let Some(api_err) = cause.downcast_ref::<ApiError>() {
                return ExitCode::from(api_err);
            }
            if let Some(token_err) = cause.downcast_ref::<TokenError>() {
                return ExitCode::from(token_err);
            }
        }

        ExitCode::GeneralError
    }
}

/// Print an error to stderr, followed by the API error details as JSON when present.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("Error: {:#}", err);

    let details = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<ApiError>())
        .and_then(|api_err| api_err.details.as_ref());
    if let Some(details) = details
        && let Ok(json) = serde_json::to_string_pretty(details)
    {
        eprintln!("{json}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use nuvem_fiscal_client::ErrorDetails;

    #[test]
    fn test_exit_code_as_i32() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::GeneralError.as_i32(), 1);
        assert_eq!(ExitCode::AuthenticationFailed.as_i32(), 2);
        assert_eq!(ExitCode::RateLimited.as_i32(), 7);
        assert_eq!(ExitCode::UpstreamError.as_i32(), 8);
        assert_eq!(ExitCode::Interrupted.as_i32(), 130);
    }

    #[test]
    fn test_is_retryable() {
        assert!(!ExitCode::Success.is_retryable());
        assert!(!ExitCode::AuthenticationFailed.is_retryable());
        assert!(ExitCode::ConnectionError.is_retryable());
        assert!(!ExitCode::NotFound.is_retryable());
        assert!(!ExitCode::ValidationError.is_retryable());
        assert!(ExitCode::RateLimited.is_retryable());
        assert!(ExitCode::UpstreamError.is_retryable());
    }

    #[test]
    fn test_every_category_has_distinct_code() {
        let codes = [
            ErrorCategory::Unauthorized,
            ErrorCategory::NotFound,
            ErrorCategory::ValidationFailed,
            ErrorCategory::RateLimited,
            ErrorCategory::UpstreamError,
            ErrorCategory::TransportError,
        ]
        .map(|c| ExitCode::from(c).as_i32());

        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
        assert!(!codes.contains(&0));
        assert!(!codes.contains(&1));
    }

    #[test]
    fn test_token_error_mapping() {
        let rejected = TokenError::AuthenticationFailed {
            status: 401,
            body: "invalid_client".to_string(),
        };
        assert_eq!(ExitCode::from(&rejected), ExitCode::AuthenticationFailed);

        let limited = TokenError::RateLimited {
            body: String::new(),
        };
        assert_eq!(ExitCode::from(&limited), ExitCode::RateLimited);
    }

    #[test]
    fn test_exit_code_found_through_context() {
        let err = Err::<(), _>(ApiError::new(ErrorCategory::NotFound, "Empresa não encontrada"))
            .context("GET /empresas/1 failed")
            .unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::NotFound);
    }

    #[test]
    fn test_non_api_error_is_general() {
        let err = anyhow::anyhow!("Failed to read body file");
        assert_eq!(err.exit_code(), ExitCode::GeneralError);
    }

    #[test]
    fn test_upstream_401_maps_to_auth_failed() {
        let err: anyhow::Error = ApiError::new(ErrorCategory::Unauthorized, "denied")
            .with_details(ErrorDetails {
                status_code: Some(401),
                ..Default::default()
            })
            .into();
        assert_eq!(err.exit_code(), ExitCode::AuthenticationFailed);
    }
}
