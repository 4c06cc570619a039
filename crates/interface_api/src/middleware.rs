//! API middleware

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

/// Header carrying the request id back to the caller
pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Request logging middleware
///
/// Tags every request with a fresh id, logs method, uri, status and
/// duration, and echoes the id in the `x-request-id` response header.
pub async fn request_logging_middleware(request: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let span = info_span!("request", %request_id, %method, %uri);

    let start = Instant::now();
    let mut response = next.run(request).instrument(span.clone()).await;
    let status = response.status();

    span.in_scope(|| {
        info!(
            status = status.as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "API request"
        );
    });

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER.clone(), value);
    }
    response
}
