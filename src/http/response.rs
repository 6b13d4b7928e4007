//! Response handling and transformation.
//!
//! # Responsibilities
//! - Turn a backend response into a client response
//! - Strip hop-by-hop headers
//! - Map routing and fetch failures to status codes
//!
//! # Design Decisions
//! - Backend bodies are streamed, never buffered
//! - Backend status is passed through verbatim
//! - Transport failures: 502 Bad Gateway, timeouts: 504 Gateway Timeout

use axum::{
    body::Body,
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
};

use crate::fetch::FetchError;

/// Headers that describe a single connection and must not be forwarded.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(name)
}

/// Stream a backend response back to the client.
pub fn into_client_response(upstream: reqwest::Response) -> Response {
    let status = upstream.status();

    let mut builder = Response::builder().status(status);
    if let Some(headers) = builder.headers_mut() {
        for (name, value) in upstream.headers() {
            if !is_hop_by_hop(name) {
                headers.append(name.clone(), value.clone());
            }
        }
    }

    match builder.body(Body::from_stream(upstream.bytes_stream())) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build client response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Response for a query the router rejected.
pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

/// Response for a backend fetch that failed.
pub fn fetch_failed(error: &FetchError) -> Response {
    let status = error.status();
    let message = status.canonical_reason().unwrap_or("Backend error");
    (status, message).into_response()
}
