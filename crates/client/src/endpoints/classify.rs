//! Response classification for API calls.
//!
//! Maps an HTTP status and body onto either an [`ApiResponse`] or an
//! [`ApiError`] with the matching [`ErrorCategory`]. Pure: side effects such
//! as token invalidation belong to the caller.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApiError, ApiResponse, ErrorCategory, ErrorDetails, body_value};

/// Classify a completed response.
///
/// 2xx bodies that do not parse as `T` become `data: None` rather than an error.
pub(crate) fn classify<T: DeserializeOwned>(
    status: StatusCode,
    bytes: &[u8],
) -> Result<ApiResponse<T>, ApiError> {
    if status.is_success() {
        let data = if status == StatusCode::NO_CONTENT || bytes.is_empty() {
            None
        } else {
            serde_json::from_slice(bytes).ok()
        };
        return Ok(ApiResponse {
            status: status.as_u16(),
            data,
        });
    }

    let body = body_value(bytes);
    let category = category_for(status);
    let message = upstream_message(&body).unwrap_or_else(|| default_message(category).to_string());

    let validation = (category == ErrorCategory::ValidationFailed && !body.is_null())
        .then(|| body.clone());

    Err(ApiError::new(category, message).with_details(ErrorDetails {
        status_code: Some(status.as_u16()),
        body: (!body.is_null()).then_some(body),
        validation,
        original_error: None,
    }))
}

fn category_for(status: StatusCode) -> ErrorCategory {
    match status {
        StatusCode::UNAUTHORIZED => ErrorCategory::Unauthorized,
        StatusCode::NOT_FOUND => ErrorCategory::NotFound,
        StatusCode::UNPROCESSABLE_ENTITY => ErrorCategory::ValidationFailed,
        StatusCode::TOO_MANY_REQUESTS => ErrorCategory::RateLimited,
        _ => ErrorCategory::UpstreamError,
    }
}

fn default_message(category: ErrorCategory) -> &'static str {
    match category {
        ErrorCategory::Unauthorized => "Unauthorized",
        ErrorCategory::NotFound => "Resource not found",
        ErrorCategory::ValidationFailed => "Validation failed",
        ErrorCategory::RateLimited => "Rate limit exceeded",
        ErrorCategory::UpstreamError => "Upstream error",
        ErrorCategory::TransportError => "Transport error",
    }
}

/// Pull a human-readable message out of the usual Nuvem Fiscal error shapes:
/// `{"error": {"message": ..}}`, `{"message": ..}` or `{"error": ".."}`.
fn upstream_message(body: &Value) -> Option<String> {
    let candidate = body
        .pointer("/error/message")
        .or_else(|| body.get("message"))
        .or_else(|| body.get("error").filter(|v| v.is_string()))?;
    candidate
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
