//! JSON request execution and classification.
//!
//! Every call follows the same sequence: obtain a token, send the request with
//! `Authorization: Bearer`, classify the response, and invalidate the rejected
//! token on 401. The optional single re-attempt after a 401 lives in [`FiscalClient::execute`]
//! so uploads share it.

use std::future::Future;
use std::time::Instant;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::client::{FiscalClient, RequestOptions};
use crate::endpoints::classify;
use crate::error::{ApiError, ErrorCategory, ErrorDetails, RequestResult};
use crate::query::QueryParams;
use crate::tracing::inject_trace_context;

const JSON: &str = "application/json";

impl FiscalClient {
    /// Send a JSON request to `api_base_url + path`.
    ///
    /// `body` is sent only for non-GET methods. `None` query values are skipped.
    /// Failures are returned as [`ApiError`]; this never panics on upstream input.
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        query: Option<&QueryParams>,
    ) -> RequestResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request_with(method, path, body, query, &RequestOptions::default())
            .await
    }

    /// [`Self::request`] with per-call timeout and cancellation.
    #[tracing::instrument(skip(self, method, body, query, options), fields(method = %method))]
    pub async fn request_with<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        query: Option<&QueryParams>,
        options: &RequestOptions,
    ) -> RequestResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let payload = match body {
            Some(body) if method != Method::GET => Some(serde_json::to_vec(body).map_err(|e| {
                ApiError::new(
                    ErrorCategory::TransportError,
                    "failed to serialize request body",
                )
                .with_details(ErrorDetails {
                    original_error: Some(e.to_string()),
                    ..ErrorDetails::default()
                })
            })?),
            _ => None,
        };

        self.execute(method, path, options, |builder| {
            let builder = match query {
                Some(query) if !query.is_empty() => builder.query(&query.to_vec()),
                _ => builder,
            };
            match &payload {
                Some(bytes) => builder.header(CONTENT_TYPE, JSON).body(bytes.clone()),
                None => builder,
            }
        })
        .await
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Option<&QueryParams>,
    ) -> RequestResult<T> {
        self.request::<T, Value>(Method::GET, path, None, query)
            .await
    }

    pub async fn post<T, B>(&self, path: &str, body: Option<&B>) -> RequestResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, body, None).await
    }

    pub async fn put<T, B>(&self, path: &str, body: Option<&B>) -> RequestResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, path, body, None).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> RequestResult<T> {
        self.request::<T, Value>(Method::DELETE, path, None, None)
            .await
    }

    /// Run one attempt, and a second one after a 401 when enabled.
    ///
    /// `attach` decorates the authenticated request builder with query, body
    /// or multipart form; it is called once per attempt.
    pub(crate) async fn execute<T, F>(
        &self,
        method: Method,
        path: &str,
        options: &RequestOptions,
        attach: F,
    ) -> RequestResult<T>
    where
        T: DeserializeOwned,
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let result = self
            .cancellable(options, self.attempt(&method, path, options, &attach))
            .await;

        match result {
            Err(e) if self.retry_on_unauthorized && e.is_upstream_unauthorized() => {
                debug!("Unauthorized, retrying once with a fresh token");
                if let Some(metrics) = &self.metrics {
                    metrics.record_retry(path, method.as_str());
                }
                self.cancellable(options, self.attempt(&method, path, options, &attach))
                    .await
            }
            other => other,
        }
    }

    async fn cancellable<T>(
        &self,
        options: &RequestOptions,
        call: impl Future<Output = RequestResult<T>>,
    ) -> RequestResult<T> {
        match &options.cancel {
            Some(cancel) => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        debug!("Request cancelled");
                        Err(ApiError::cancelled())
                    }
                    result = call => result,
                }
            }
            None => call.await,
        }
    }

    async fn attempt<T, F>(
        &self,
        method: &Method,
        path: &str,
        options: &RequestOptions,
        attach: &F,
    ) -> RequestResult<T>
    where
        T: DeserializeOwned,
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let token = match self.token_cache.get_token().await {
            Ok(token) => token,
            Err(e) => {
                let error = ApiError::from(e);
                self.record_error(path, method, &error);
                return Err(error);
            }
        };

        let url = self.url_for(path);
        let mut builder = self
            .http
            .request(method.clone(), &url)
            .bearer_auth(&token)
            .header(ACCEPT, JSON);
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let builder = inject_trace_context(attach(builder));

        debug!("Sending {} {}", method, url);
        if let Some(metrics) = &self.metrics {
            metrics.record_request(path, method.as_str());
        }

        let start = Instant::now();
        let outcome = match builder.send().await {
            Ok(response) => {
                let status = response.status();
                response
                    .bytes()
                    .await
                    .map(|bytes| (status, bytes))
                    .map_err(|e| ApiError::transport(&e))
            }
            Err(e) => Err(ApiError::transport(&e)),
        };

        let (status, bytes) = match outcome {
            Ok(received) => received,
            Err(error) => {
                warn!(error = ?error.details, "Transport failure for {} {}", method, path);
                self.record_duration(path, method, start, None);
                self.record_error(path, method, &error);
                return Err(error);
            }
        };
        self.record_duration(path, method, start, Some(status.as_u16()));

        let result = classify::<T>(status, &bytes);
        if let Err(error) = &result {
            if status == StatusCode::UNAUTHORIZED {
                warn!("API rejected the token, invalidating cached token");
                self.token_cache.invalidate_if(&token);
            } else {
                warn!(
                    category = %error.category,
                    status = status.as_u16(),
                    "{} {} failed: {}",
                    method,
                    path,
                    error.message
                );
            }
            self.record_error(path, method, error);
        }
        result
    }

    /// `api_base_url + path`, inserting the separating slash when missing.
    pub(crate) fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn record_duration(&self, path: &str, method: &Method, start: Instant, status: Option<u16>) {
        if let Some(metrics) = &self.metrics {
            metrics.record_request_duration(path, method.as_str(), start.elapsed(), status);
        }
    }

    fn record_error(&self, path: &str, method: &Method, error: &ApiError) {
        if let Some(metrics) = &self.metrics {
            metrics.record_error(path, method.as_str(), error.category);
        }
    }
}
