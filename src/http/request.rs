//! Request handling.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) unless the client sent one
//! - Propagate the request ID onto the response
//! - Extract the raw routing query from the request
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The legacy rewrite parameter (`?q=`) wins over the path when present

use std::collections::HashMap;

use axum::http::{HeaderMap, HeaderValue, Request};
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use uuid::Uuid;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Layer that stamps incoming requests with an `x-request-id`.
pub fn set_request_id_layer() -> SetRequestIdLayer<UuidRequestId> {
    SetRequestIdLayer::x_request_id(UuidRequestId)
}

/// Layer that copies `x-request-id` from the request onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

/// The request ID of an incoming request, or "unknown".
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Select the raw routing query for a request.
///
/// `path` is the decoded request path without its leading slash.
pub fn raw_query(path: &str, params: &HashMap<String, String>, query_param: Option<&str>) -> String {
    query_param
        .and_then(|name| params.get(name))
        .map(String::as_str)
        .unwrap_or(path)
        .to_string()
}
