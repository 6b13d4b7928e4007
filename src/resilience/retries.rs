//! Retry logic.
//!
//! # Responsibilities
//! - Decide whether a failed backend fetch is worth repeating
//! - Cap the number of attempts per request
//!
//! # Design Decisions
//! - Only GETs are issued to the backend, so every fetch is idempotent
//! - Connection errors and timeouts are always retryable
//! - Only gateway-style 5xx (502, 503, 504) are retried; a 500 is an answer

use axum::http::StatusCode;

use crate::config::RetryConfig;

/// Returns true if a backend answering with `status` should be asked again.
pub fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Returns true if a transport error should be retried.
pub fn is_retryable_error(error: &reqwest::Error) -> bool {
    error.is_connect() || error.is_timeout()
}

/// Number of attempts a fetch may make under this config.
pub fn max_attempts(config: &RetryConfig) -> u32 {
    if config.enabled {
        config.max_attempts.max(1)
    } else {
        1
    }
}
