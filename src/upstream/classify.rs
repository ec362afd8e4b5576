//! Failure classification for upstream fetches.
//!
//! Classes are mutually exclusive and checked in this order:
//! upstream 429, upstream 5xx, local timeout, no response, anything else.

use std::error::Error as StdError;
use std::io;

use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use thiserror::Error;

/// Why an upstream fetch did not produce a deliverable response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("upstream is rate limiting (retry after {retry_after_secs}s)")]
    RateLimitedUpstream { retry_after_secs: u64 },

    #[error("upstream returned {status}")]
    UpstreamError { status: u16 },

    #[error("upstream timed out")]
    Timeout,

    /// `connected` is false when the connection was never established.
    #[error("upstream unreachable: {cause}")]
    GatewayUnreachable { cause: String, connected: bool },

    #[error("request setup failed: {0}")]
    RequestSetupFailed(String),
}

impl FetchFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            FetchFailure::RateLimitedUpstream { .. } => "rate_limited_upstream",
            FetchFailure::UpstreamError { .. } => "upstream_error",
            FetchFailure::Timeout => "timeout",
            FetchFailure::GatewayUnreachable { .. } => "gateway_unreachable",
            FetchFailure::RequestSetupFailed(_) => "request_setup_failed",
        }
    }
}

/// Parse an integer `Retry-After` header. HTTP dates are not honored.
pub fn parse_retry_after(value: Option<&HeaderValue>) -> Option<u64> {
    value?.to_str().ok()?.trim().parse().ok()
}

/// Classify a response status. `None` means the response is deliverable.
pub fn classify_status(
    status: StatusCode,
    headers: &HeaderMap,
    default_retry_after_secs: u64,
) -> Option<FetchFailure> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs =
            parse_retry_after(headers.get(RETRY_AFTER)).unwrap_or(default_retry_after_secs);
        return Some(FetchFailure::RateLimitedUpstream { retry_after_secs });
    }
    if status.is_server_error() {
        return Some(FetchFailure::UpstreamError {
            status: status.as_u16(),
        });
    }
    None
}

/// Classify a transport error raised before a complete response arrived.
pub fn classify_transport(error: &reqwest::Error) -> FetchFailure {
    if error.is_timeout() {
        return FetchFailure::Timeout;
    }
    match lost_connection(error) {
        Some(Lost::Refused) => FetchFailure::GatewayUnreachable {
            cause: root_cause(error),
            connected: false,
        },
        Some(Lost::Dropped) => FetchFailure::GatewayUnreachable {
            cause: root_cause(error),
            connected: !error.is_connect(),
        },
        None => FetchFailure::RequestSetupFailed(root_cause(error)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lost {
    Refused,
    Dropped,
}

/// Connection refused, or established and then dropped without a response.
/// A refusal anywhere in the chain wins.
fn lost_connection(error: &reqwest::Error) -> Option<Lost> {
    let mut lost = None;
    let mut source: Option<&(dyn StdError + 'static)> = error.source();
    while let Some(err) = source {
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            match io_err.kind() {
                io::ErrorKind::ConnectionRefused => return Some(Lost::Refused),
                io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::BrokenPipe
                | io::ErrorKind::UnexpectedEof => lost = Some(Lost::Dropped),
                _ => {}
            }
        }
        if let Some(hyper_err) = err.downcast_ref::<hyper::Error>() {
            if hyper_err.is_incomplete_message() || hyper_err.is_closed() {
                lost = Some(Lost::Dropped);
            }
        }
        source = err.source();
    }
    lost
}

fn root_cause(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source: Option<&(dyn StdError + 'static)> = error.source();
    while let Some(err) = source {
        message = err.to_string();
        source = err.source();
    }
    message
}
