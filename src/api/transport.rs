//! Authenticated, retrying HTTP transport.
//!
//! Every request carries the API token in the `X-API-KEY` header. Failures to
//! obtain a response (connect, timeout, connection closed before the status
//! line) are retried under the configured [`RetryPolicy`]. Once a status line
//! has arrived the request is never sent again: a body that cannot be read
//! surfaces as [`ApiError::Transport`] with zero retries. A 2xx status is
//! handed to the caller's parser, 404 becomes [`ApiError::NotFound`], and
//! every other status becomes [`ApiError::Api`].

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::ApiError;
use super::retry::RetryPolicy;
use crate::config::ClientConfig;

/// Header carrying the API token.
pub const API_KEY_HEADER: &str = "X-API-KEY";

/// Raw response handed to parsers: status and body bytes.
#[derive(Clone, Debug)]
pub struct RawResponse {
    /// HTTP status of the response.
    pub status: StatusCode,
    /// Response body.
    pub body: Vec<u8>,
}

/// Stateless HTTP executor sharing the session token and retry policy.
#[derive(Clone, Debug)]
pub struct Transport {
    http: reqwest::Client,
    base_url: String,
    token: String,
    retry: RetryPolicy,
}

impl Transport {
    /// Builds a transport from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] when the configuration is invalid or the
    /// HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|err| ApiError::Config(err.to_string()))?;
        Ok(Self {
            http,
            base_url: config.normalised_base_url(),
            token: config.token.clone(),
            retry: RetryPolicy::with_retries(config.retries),
        })
    }

    /// Replaces the retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the active retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Returns the base URL, always ending in `/`.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a request and delegates successful responses to `parse`.
    ///
    /// `path` is relative to the base URL (for example `api/v1/auth/me`).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] once retries are exhausted or when the
    /// response body cannot be read, [`ApiError::NotFound`] on 404, [`ApiError::Api`] on any other
    /// non-success status, or whatever `parse` returns.
    pub async fn execute<B, T, P>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        parse: P,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        P: FnOnce(RawResponse) -> Result<T, ApiError>,
    {
        let url = format!("{}{}", self.base_url, path.trim_start_matches('/'));
        let payload = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|err| ApiError::Validation(format!("failed to encode request body: {err}")))?;

        let response = self
            .retry
            .run(|| self.send_once(&method, &url, payload.as_deref()))
            .await
            .map_err(|err| ApiError::Transport {
                retries: self.retry.retries(),
                message: err.to_string(),
            })?;
        let status = response.status();
        debug!(%method, %url, status = status.as_u16(), "received response");

        let body = response
            .bytes()
            .await
            .map_err(|err| ApiError::Transport {
                retries: 0,
                message: format!("reading response body from {url}: {err}"),
            })?
            .to_vec();
        classify(&url, RawResponse { status, body }).and_then(parse)
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &str,
        payload: Option<&[u8]>,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let mut request = self
            .http
            .request(method.clone(), url)
            .header(API_KEY_HEADER, &self.token);
        if let Some(bytes) = payload {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(bytes.to_vec());
        }
        request.send().await
    }
}

fn classify(url: &str, response: RawResponse) -> Result<RawResponse, ApiError> {
    if response.status.is_success() {
        return Ok(response);
    }
    if response.status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::Api {
        url: url.to_owned(),
        status: response.status.as_u16(),
        body: String::from_utf8_lossy(&response.body).into_owned(),
    })
}

/// Parser that requires `expected` and decodes the body as JSON.
pub(crate) fn expect_json<T: DeserializeOwned>(
    operation: &'static str,
    expected: StatusCode,
) -> impl FnOnce(RawResponse) -> Result<T, ApiError> {
    move |response| {
        if response.status != expected {
            return Err(ApiError::schema(
                operation,
                format!(
                    "expected response with code {} but received {}, most likely the API changed",
                    expected.as_u16(),
                    response.status.as_u16()
                ),
            ));
        }
        serde_json::from_slice(&response.body)
            .map_err(|err| ApiError::schema(operation, format!("invalid JSON response: {err}")))
    }
}

/// Parser that accepts any success status and ignores the body.
pub(crate) fn discard_body(_response: RawResponse) -> Result<(), ApiError> {
    Ok(())
}
