//! Error types for the Nuvem Fiscal client.
//!
//! Three layers, each closed:
//! - [`ClientError`]: construction failures (missing credentials, bad URLs).
//! - [`TokenError`]: the client-credentials exchange failed.
//! - [`ApiError`]: the classified outcome of a failed API call, tagged with an
//!   [`ErrorCategory`] that callers match on.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Result type alias for client construction.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Result of a single authenticated API call.
pub type RequestResult<T> = std::result::Result<ApiResponse<T>, ApiError>;

/// Errors raised while building a [`crate::FiscalClient`] or [`crate::TokenCache`].
#[derive(Error, Debug)]
pub enum ClientError {
    /// Required credential field was not supplied.
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTTP client could not be built.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Two builder options that cannot be combined.
    #[error("Conflicting options: {0}")]
    ConflictingOptions(String),
}

/// Failures of the OAuth2 client-credentials exchange.
///
/// `Clone` so one failed exchange can be handed to every caller that waited on it.
#[derive(Error, Debug, Clone)]
pub enum TokenError {
    /// The token endpoint answered with a non-2xx status, or a 2xx body
    /// without a usable `access_token`/`expires_in`.
    #[error("Authentication failed ({status}): {body}")]
    AuthenticationFailed { status: u16, body: String },

    /// The token endpoint answered 429.
    #[error("Token endpoint rate limited the client")]
    RateLimited { body: String },

    /// The token endpoint could not be reached (DNS, refused, timeout).
    #[error("Token endpoint unreachable: {0}")]
    Transport(#[source] Arc<reqwest::Error>),
}

impl TokenError {
    pub(crate) fn transport(error: reqwest::Error) -> Self {
        Self::Transport(Arc::new(error))
    }

    /// HTTP status returned by the token endpoint, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AuthenticationFailed { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            Self::Transport(_) => None,
        }
    }
}

/// Closed set of failure categories for API calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// 401 from the API, or the token could not be obtained.
    Unauthorized,
    /// 404.
    NotFound,
    /// 422; `details.validation` carries the upstream payload.
    ValidationFailed,
    /// 429.
    RateLimited,
    /// Any other non-2xx status.
    UpstreamError,
    /// No HTTP response at all: DNS, refused, timeout, cancellation.
    TransportError,
}

impl ErrorCategory {
    /// Returns the string label for this error category.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Unauthorized => "unauthorized",
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::ValidationFailed => "validation_failed",
            ErrorCategory::RateLimited => "rate_limited",
            ErrorCategory::UpstreamError => "upstream_error",
            ErrorCategory::TransportError => "transport_error",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw upstream context attached to an [`ApiError`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ErrorDetails {
    /// HTTP status, when a response was received.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Parsed JSON body, or the raw text as a JSON string when it is not JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Validation payload of a 422 response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<Value>,
    /// Display text of the underlying transport error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_error: Option<String>,
}

/// A classified API failure.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{category}: {message}")]
pub struct ApiError {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

impl ApiError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: ErrorDetails) -> Self {
        self.details = Some(details);
        self
    }

    /// Build a `TransportError` from a reqwest failure.
    pub(crate) fn transport(error: &reqwest::Error) -> Self {
        let message = if error.is_timeout() {
            "request timed out".to_string()
        } else if error.is_connect() {
            "connection failed".to_string()
        } else {
            "transport failure".to_string()
        };
        Self::new(ErrorCategory::TransportError, message).with_details(ErrorDetails {
            original_error: Some(error.to_string()),
            ..ErrorDetails::default()
        })
    }

    /// `TransportError` raised when the caller cancelled the call.
    pub(crate) fn cancelled() -> Self {
        Self::new(ErrorCategory::TransportError, "request cancelled")
    }

    /// HTTP status carried in the details, if any.
    pub fn status_code(&self) -> Option<u16> {
        self.details.as_ref().and_then(|d| d.status_code)
    }

    /// True for a 401 answered by the API itself (not a token exchange failure).
    pub fn is_upstream_unauthorized(&self) -> bool {
        self.category == ErrorCategory::Unauthorized && self.status_code() == Some(401)
    }

    /// Check if a caller could reasonably retry this error later.
    ///
    /// This is advisory; the client itself never retries these.
    pub fn is_retryable(&self) -> bool {
        match self.category {
            ErrorCategory::RateLimited | ErrorCategory::TransportError => true,
            ErrorCategory::UpstreamError => self.status_code().is_some_and(|s| s >= 500),
            _ => false,
        }
    }
}

impl From<TokenError> for ApiError {
    /// Token exchange failures surface as `Unauthorized`, except a 429 from
    /// the token endpoint which stays `RateLimited`.
    fn from(error: TokenError) -> Self {
        let message = error.to_string();
        match error {
            TokenError::RateLimited { body } => ApiError::new(ErrorCategory::RateLimited, message)
                .with_details(ErrorDetails {
                    status_code: Some(429),
                    body: Some(body_value(body.as_bytes())).filter(|v| !v.is_null()),
                    ..ErrorDetails::default()
                }),
            TokenError::AuthenticationFailed { status, body } => {
                ApiError::new(ErrorCategory::Unauthorized, message).with_details(ErrorDetails {
                    // The token endpoint's status, not the API's; kept out of
                    // `status_code` so `is_upstream_unauthorized` stays false.
                    body: Some(serde_json::json!({
                        "token_endpoint_status": status,
                        "body": body_value(body.as_bytes()),
                    })),
                    ..ErrorDetails::default()
                })
            }
            TokenError::Transport(e) => {
                ApiError::new(ErrorCategory::Unauthorized, message).with_details(ErrorDetails {
                    original_error: Some(e.to_string()),
                    ..ErrorDetails::default()
                })
            }
        }
    }
}

/// Successful API call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse<T> {
    /// 2xx status returned by the API.
    pub status: u16,
    /// Parsed body; `None` for 204 and for bodies that did not parse as `T`.
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn is_no_content(&self) -> bool {
        self.status == 204
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

/// Interpret a response body: JSON if it parses, otherwise the text as a
/// JSON string, `Null` when empty.
pub(crate) fn body_value(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn err(category: ErrorCategory, status: Option<u16>) -> ApiError {
        ApiError::new(category, "test").with_details(ErrorDetails {
            status_code: status,
            ..ErrorDetails::default()
        })
    }

    #[test]
    fn test_error_is_retryable() {
        assert!(err(ErrorCategory::RateLimited, Some(429)).is_retryable());
        assert!(err(ErrorCategory::TransportError, None).is_retryable());
        assert!(err(ErrorCategory::UpstreamError, Some(503)).is_retryable());

        assert!(!err(ErrorCategory::UpstreamError, Some(409)).is_retryable());
        assert!(!err(ErrorCategory::NotFound, Some(404)).is_retryable());
        assert!(!err(ErrorCategory::ValidationFailed, Some(422)).is_retryable());
        assert!(!err(ErrorCategory::Unauthorized, Some(401)).is_retryable());
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(ErrorCategory::Unauthorized.as_str(), "unauthorized");
        assert_eq!(ErrorCategory::NotFound.as_str(), "not_found");
        assert_eq!(ErrorCategory::ValidationFailed.as_str(), "validation_failed");
        assert_eq!(ErrorCategory::RateLimited.as_str(), "rate_limited");
        assert_eq!(ErrorCategory::UpstreamError.as_str(), "upstream_error");
        assert_eq!(ErrorCategory::TransportError.as_str(), "transport_error");
        assert_eq!(
            serde_json::to_value(ErrorCategory::ValidationFailed).unwrap(),
            "validation_failed"
        );
    }

    #[test]
    fn test_token_failure_maps_to_unauthorized() {
        let api: ApiError = TokenError::AuthenticationFailed {
            status: 400,
            body: r#"{"error":"invalid_client"}"#.to_string(),
        }
        .into();

        assert_eq!(api.category, ErrorCategory::Unauthorized);
        assert!(!api.is_upstream_unauthorized());
        let body = api.details.unwrap().body.unwrap();
        assert_eq!(body["token_endpoint_status"], 400);
        assert_eq!(body["body"]["error"], "invalid_client");
    }

    #[test]
    fn test_token_rate_limit_maps_to_rate_limited() {
        let api: ApiError = TokenError::RateLimited {
            body: String::new(),
        }
        .into();
        assert_eq!(api.category, ErrorCategory::RateLimited);
        assert_eq!(api.status_code(), Some(429));
        assert!(api.details.unwrap().body.is_none());
    }

    #[test]
    fn test_body_value() {
        assert_eq!(body_value(b""), Value::Null);
        assert_eq!(body_value(b"  \n"), Value::Null);
        assert_eq!(body_value(br#"{"a":1}"#)["a"], 1);
        assert_eq!(body_value(b"plain text"), Value::String("plain text".into()));
    }

    #[test]
    fn test_api_error_display() {
        let e = ApiError::new(ErrorCategory::NotFound, "Resource not found");
        assert_eq!(e.to_string(), "not_found: Resource not found");
    }
}
