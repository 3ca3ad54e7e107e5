//! Client-credentials exchange against the token endpoint.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::debug;

use crate::auth::Credentials;
use crate::error::TokenError;

/// Successful token endpoint payload. Extra fields are ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}

/// POST the client credentials as a form and parse the token response.
///
/// `timeout` bounds the whole exchange regardless of how `client` was built.
pub(crate) async fn exchange_client_credentials(
    client: &Client,
    credentials: &Credentials,
    timeout: Duration,
) -> Result<TokenResponse, TokenError> {
    debug!(
        "Requesting client-credentials token for {}",
        credentials.client_id
    );

    let form = [
        ("grant_type", "client_credentials"),
        ("client_id", credentials.client_id.as_str()),
        ("client_secret", credentials.client_secret.expose_secret()),
        ("scope", credentials.scope.as_str()),
    ];

    let response = client
        .post(&credentials.token_url)
        .header(reqwest::header::ACCEPT, "application/json")
        .form(&form)
        .timeout(timeout)
        .send()
        .await
        .map_err(TokenError::transport)?;

    let status = response.status();
    let body = response.text().await.map_err(TokenError::transport)?;

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(TokenError::RateLimited { body });
    }
    if !status.is_success() {
        return Err(TokenError::AuthenticationFailed {
            status: status.as_u16(),
            body,
        });
    }

    // The body holds the token; never echo it back in the error.
    match serde_json::from_str::<TokenResponse>(&body) {
        Ok(token) if !token.access_token.is_empty() => Ok(token),
        _ => Err(TokenError::AuthenticationFailed {
            status: status.as_u16(),
            body: "token response is missing access_token or expires_in".to_string(),
        }),
    }
}
