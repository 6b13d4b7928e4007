//! Backend content fetching.
//!
//! # Responsibilities
//! - GET a resolved backend URL
//! - Enforce connect, per-attempt and whole-fetch timeouts
//! - Retry transient failures with backoff
//! - Propagate the request ID to the backend
//!
//! # Design Decisions
//! - The response body is not buffered; callers stream it onward
//! - System proxies are ignored, the backend is reached directly
//! - Errors are classified so the HTTP layer can pick 502 vs 504

use std::time::Duration;

use axum::http::StatusCode;
use thiserror::Error;

use crate::config::{RetryConfig, TimeoutConfig};
use crate::http::request::X_REQUEST_ID;
use crate::observability::metrics;
use crate::resilience::{backoff_for, is_retryable_error, is_retryable_status, max_attempts};

/// Error type for backend fetches.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build backend client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("backend timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("backend did not answer within {0:?}")]
    Deadline(Duration),

    #[error("backend unreachable: {0}")]
    Connect(#[source] reqwest::Error),

    #[error("backend request failed: {0}")]
    Request(#[source] reqwest::Error),
}

impl FetchError {
    /// Status returned to the client when the fetch fails.
    pub fn status(&self) -> StatusCode {
        match self {
            FetchError::Timeout(_) | FetchError::Deadline(_) => StatusCode::GATEWAY_TIMEOUT,
            FetchError::Client(_) => StatusCode::INTERNAL_SERVER_ERROR,
            FetchError::Connect(_) | FetchError::Request(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout(e)
        } else if e.is_connect() {
            FetchError::Connect(e)
        } else {
            FetchError::Request(e)
        }
    }
}

/// Fetches resolved URLs from the backend.
#[derive(Debug, Clone)]
pub struct ContentFetcher {
    client: reqwest::Client,
    retries: RetryConfig,
    budget: Duration,
}

impl ContentFetcher {
    /// Build a fetcher with the configured timeouts and retry policy.
    ///
    /// `timeouts.request_secs` bounds a single attempt and also the whole
    /// fetch, retries and backoff included.
    pub fn new(timeouts: &TimeoutConfig, retries: RetryConfig) -> Result<Self, FetchError> {
        let budget = Duration::from_secs(timeouts.request_secs);
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(budget)
            .no_proxy()
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            retries,
            budget,
        })
    }

    /// Time allowed for one `fetch` call.
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// GET `url`, retrying transient failures.
    ///
    /// A response is returned for any status the backend answers with once
    /// retries are exhausted; only transport failures become errors. If no
    /// response arrives within the budget the fetch fails with
    /// [`FetchError::Deadline`].
    pub async fn fetch(&self, url: &str, request_id: &str) -> Result<reqwest::Response, FetchError> {
        match tokio::time::timeout(self.budget, self.fetch_with_retries(url, request_id)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(request_id = %request_id, url = %url, budget = ?self.budget, "Backend fetch budget exhausted");
                Err(FetchError::Deadline(self.budget))
            }
        }
    }

    async fn fetch_with_retries(&self, url: &str, request_id: &str) -> Result<reqwest::Response, FetchError> {
        let max_attempts = max_attempts(&self.retries);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let result = self
                .client
                .get(url)
                .header(X_REQUEST_ID, request_id)
                .send()
                .await;

            match result {
                Ok(response) => {
                    let status = response.status();
                    if attempt < max_attempts && is_retryable_status(status) {
                        let delay = backoff_for(&self.retries, attempt);
                        tracing::info!(
                            request_id = %request_id,
                            url = %url,
                            attempt,
                            status = %status,
                            delay = ?delay,
                            "Retrying backend fetch"
                        );
                        metrics::record_retry();
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Ok(response);
                }
                Err(e) => {
                    tracing::error!(request_id = %request_id, url = %url, attempt, error = %e, "Backend fetch failed");
                    if attempt < max_attempts && is_retryable_error(&e) {
                        let delay = backoff_for(&self.retries, attempt);
                        tracing::info!(request_id = %request_id, attempt, delay = ?delay, "Retrying after network error");
                        metrics::record_retry();
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(FetchError::from(e));
                }
            }
        }
    }
}
