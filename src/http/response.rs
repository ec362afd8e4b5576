//! Outcome to HTTP response mapping.
//!
//! # Responsibilities
//! - Mirror upstream status, payload and content type on success
//! - Mark whether the payload came from the cache
//! - Render every failure as a JSON error body
//!
//! # Design Decisions
//! - No content type is invented when upstream sent none
//! - Error status codes follow [`GatewayError::status`]

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;

use crate::error::GatewayError;
use crate::http::gateway::GatewayOutcome;

/// Response header reporting `hit` or `miss`.
pub const X_RELAY_CACHE: &str = "x-relay-cache";

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.to_body())).into_response()
    }
}

impl GatewayOutcome {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayOutcome::CacheHit(entry) => {
                StatusCode::from_u16(entry.status).unwrap_or(StatusCode::OK)
            }
            GatewayOutcome::Fetched(response) => {
                StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            GatewayOutcome::Failed(err) => err.status(),
        }
    }
}

impl IntoResponse for GatewayOutcome {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            GatewayOutcome::CacheHit(entry) => {
                passthrough(status, entry.payload, entry.content_type.as_deref(), "hit")
            }
            GatewayOutcome::Fetched(response) => {
                passthrough(status, response.payload, response.content_type.as_deref(), "miss")
            }
            GatewayOutcome::Failed(err) => err.into_response(),
        }
    }
}

fn passthrough(
    status: StatusCode,
    payload: Bytes,
    content_type: Option<&str>,
    cache: &'static str,
) -> Response {
    let mut response = Response::new(Body::from(payload));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    if let Some(value) = content_type.and_then(|ct| HeaderValue::from_str(ct).ok()) {
        headers.insert(CONTENT_TYPE, value);
    }
    headers.insert(
        HeaderName::from_static(X_RELAY_CACHE),
        HeaderValue::from_static(cache),
    );
    response
}
