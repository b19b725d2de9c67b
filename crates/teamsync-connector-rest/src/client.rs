//! Shared HTTP client for the REST stores (reqwest-based).
//!
//! Handles the parts every endpoint has in common: building the URL from
//! percent-encoded path segments, presenting the caller's bearer credential,
//! mapping HTTP status codes to [`StoreError`] and retrying transient
//! failures.

use reqwest::{Client, Method, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use teamsync_core::{Credential, StoreError, StoreResult};
use tracing::debug;

use crate::config::RestStoreConfig;
use crate::retry::RetryPolicy;

/// HTTP client bound to one store's base URL.
#[derive(Debug, Clone)]
pub struct RestClient {
    base_url: Url,
    http_client: Client,
    retry: RetryPolicy,
    timeout: Duration,
}

impl RestClient {
    /// Create a client from a store configuration.
    pub fn new(config: &RestStoreConfig) -> Result<Self, String> {
        config.validate()?;
        let http_client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("teamsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| format!("failed to build HTTP client: {e}"))?;

        Ok(Self {
            base_url: config.parse_base_url()?,
            http_client,
            retry: config.retry.clone(),
            timeout: config.timeout,
        })
    }

    /// Create a client with a pre-built `reqwest::Client` (for testing).
    pub fn with_http_client(
        config: &RestStoreConfig,
        http_client: Client,
    ) -> Result<Self, String> {
        Ok(Self {
            base_url: config.parse_base_url()?,
            http_client,
            retry: config.retry.clone(),
            timeout: config.timeout,
        })
    }

    /// Get the base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an endpoint URL from raw path segments. Each segment is
    /// percent-encoded, so opaque IDs cannot change the path shape.
    pub fn endpoint(&self, segments: &[&str]) -> StoreResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                StoreError::rejected(format!("base URL cannot carry a path: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // ── Verbs ─────────────────────────────────────────────────────────

    /// GET and decode a JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        credential: &Credential,
        url: &Url,
    ) -> StoreResult<T> {
        let response = self.send(credential, Method::GET, url, None, &[]).await?;
        decode(response).await
    }

    /// GET and decode a JSON body; a 404 means the resource does not exist.
    pub async fn get_optional<T: DeserializeOwned>(
        &self,
        credential: &Credential,
        url: &Url,
    ) -> StoreResult<Option<T>> {
        let response = self
            .send(credential, Method::GET, url, None, &[StatusCode::NOT_FOUND])
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        decode(response).await.map(Some)
    }

    /// Send a request and return the response when its status is a success
    /// or one of `accept`. Any other status becomes a [`StoreError`].
    pub async fn send(
        &self,
        credential: &Credential,
        method: Method,
        url: &Url,
        body: Option<&Value>,
        accept: &[StatusCode],
    ) -> StoreResult<Response> {
        let operation = format!("{method} {}", url.path());
        self.retry
            .execute(&operation, move || {
                let method = method.clone();
                async move { self.send_once(credential, method, url, body, accept).await }
            })
            .await
    }

    async fn send_once(
        &self,
        credential: &Credential,
        method: Method,
        url: &Url,
        body: Option<&Value>,
        accept: &[StatusCode],
    ) -> StoreResult<Response> {
        debug!(method = %method, url = %url, "Sending store request");

        let mut builder = self.http_client.request(method, url.clone());
        if let Some(token) = credential.bearer_token() {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if status.is_success() || accept.contains(&status) {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(error_for_status(status, &body))
    }

    fn transport_error(&self, error: &reqwest::Error) -> StoreError {
        if error.is_timeout() {
            StoreError::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            StoreError::unavailable(error.to_string())
        }
    }
}

// ── Response Handling ─────────────────────────────────────────────────

async fn decode<T: DeserializeOwned>(response: Response) -> StoreResult<T> {
    let body = response
        .text()
        .await
        .map_err(|e| StoreError::unavailable(format!("failed to read response body: {e}")))?;
    serde_json::from_str(&body)
        .map_err(|e| StoreError::invalid_data(format!("failed to parse response: {e}")))
}

/// Map an unsuccessful HTTP status to a store error.
///
/// 401/403 are credential problems, 408/429/5xx are transient, and every
/// other status is a rejection. A JSON `message` field in the body is used
/// as the error message when present.
#[must_use]
pub fn error_for_status(status: StatusCode, body: &str) -> StoreError {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| json.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());
    let message = if detail.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {detail}")
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::unauthorized(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            StoreError::unavailable(message)
        }
        s if s.is_server_error() => StoreError::unavailable(message),
        _ => StoreError::rejected(message),
    }
}
