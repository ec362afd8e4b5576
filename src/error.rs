//! Error taxonomy shared by the gateway and its client.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::loader::ConfigError;
use crate::security::rate_limit::{AdmissionScope, Denial};
use crate::upstream::classify::FetchFailure;

/// Machine-readable error kind carried in every gateway error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ClientRateLimited,
    DomainRateLimited,
    MissingTarget,
    UpstreamRateLimited,
    UpstreamError,
    Timeout,
    GatewayUnreachable,
    RequestSetupFailed,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ClientRateLimited => "client_rate_limited",
            ErrorKind::DomainRateLimited => "domain_rate_limited",
            ErrorKind::MissingTarget => "missing_target",
            ErrorKind::UpstreamRateLimited => "upstream_rate_limited",
            ErrorKind::UpstreamError => "upstream_error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::GatewayUnreachable => "gateway_unreachable",
            ErrorKind::RequestSetupFailed => "request_setup_failed",
        }
    }

    /// Rate-limit kinds are retried after the server's stated cooldown.
    pub fn is_rate_limit(&self) -> bool {
        matches!(
            self,
            ErrorKind::ClientRateLimited
                | ErrorKind::DomainRateLimited
                | ErrorKind::UpstreamRateLimited
        )
    }

    /// Whether a client may recover from this kind by retrying.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ErrorKind::MissingTarget | ErrorKind::UpstreamError)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure of a gateway request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("Too many requests from your IP")]
    ClientRateLimited { retry_after_secs: u64 },

    #[error("Too many requests to this domain")]
    DomainRateLimited { domain: String, retry_after_secs: u64 },

    #[error("URL parameter is required")]
    MissingTarget,

    #[error("The target website is rate limiting requests")]
    UpstreamRateLimited { retry_after_secs: u64 },

    #[error("The target website returned a {status} error")]
    UpstreamError { status: u16 },

    #[error("Request timeout")]
    Timeout,

    /// Refused (`connected: false`) or accepted and dropped without a response.
    #[error("{}", unreachable_title(.connected))]
    GatewayUnreachable { cause: String, connected: bool },

    #[error("Failed to fetch the requested URL")]
    RequestSetupFailed(String),
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::ClientRateLimited { .. } => ErrorKind::ClientRateLimited,
            GatewayError::DomainRateLimited { .. } => ErrorKind::DomainRateLimited,
            GatewayError::MissingTarget => ErrorKind::MissingTarget,
            GatewayError::UpstreamRateLimited { .. } => ErrorKind::UpstreamRateLimited,
            GatewayError::UpstreamError { .. } => ErrorKind::UpstreamError,
            GatewayError::Timeout => ErrorKind::Timeout,
            GatewayError::GatewayUnreachable { .. } => ErrorKind::GatewayUnreachable,
            GatewayError::RequestSetupFailed(_) => ErrorKind::RequestSetupFailed,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::ClientRateLimited { .. }
            | GatewayError::DomainRateLimited { .. }
            | GatewayError::UpstreamRateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::MissingTarget => StatusCode::BAD_REQUEST,
            GatewayError::UpstreamError { status } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            GatewayError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::GatewayUnreachable { connected: true, .. } => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::GatewayUnreachable { connected: false, .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            GatewayError::RequestSetupFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Human-readable explanation shown next to the error title.
    pub fn details(&self) -> String {
        match self {
            GatewayError::ClientRateLimited { .. } => "Please try again later".to_string(),
            GatewayError::DomainRateLimited { domain, .. } => format!(
                "You've made too many requests to {domain}. Please try again later or try a different site."
            ),
            GatewayError::MissingTarget => {
                "Pass the target as ?url=<percent-encoded URL>".to_string()
            }
            GatewayError::UpstreamRateLimited { .. } => "Too many requests to the target website. \
                 Please try again later or try a different site."
                .to_string(),
            GatewayError::UpstreamError { status } => {
                format!("The target website responded with status {status}")
            }
            GatewayError::Timeout => "The target website took too long to respond".to_string(),
            GatewayError::GatewayUnreachable { cause, connected: true } => {
                format!("The target website did not respond: {cause}")
            }
            GatewayError::GatewayUnreachable { cause, connected: false } => {
                format!("The target server refused the connection: {cause}")
            }
            GatewayError::RequestSetupFailed(cause) => cause.clone(),
        }
    }

    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            GatewayError::ClientRateLimited { retry_after_secs }
            | GatewayError::DomainRateLimited { retry_after_secs, .. }
            | GatewayError::UpstreamRateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
            kind: self.kind(),
            details: self.details(),
            retry_after: self.retry_after_secs(),
        }
    }
}

fn unreachable_title(connected: &bool) -> &'static str {
    if *connected {
        "Gateway timeout"
    } else {
        "Service unavailable"
    }
}

impl From<FetchFailure> for GatewayError {
    fn from(failure: FetchFailure) -> Self {
        match failure {
            FetchFailure::RateLimitedUpstream { retry_after_secs } => {
                GatewayError::UpstreamRateLimited { retry_after_secs }
            }
            FetchFailure::UpstreamError { status } => GatewayError::UpstreamError { status },
            FetchFailure::Timeout => GatewayError::Timeout,
            FetchFailure::GatewayUnreachable { cause, connected } => {
                GatewayError::GatewayUnreachable { cause, connected }
            }
            FetchFailure::RequestSetupFailed(cause) => GatewayError::RequestSetupFailed(cause),
        }
    }
}

impl From<Denial> for GatewayError {
    fn from(denial: Denial) -> Self {
        match denial.scope {
            AdmissionScope::Client => GatewayError::ClientRateLimited {
                retry_after_secs: denial.retry_after_secs,
            },
            AdmissionScope::Domain(domain) => GatewayError::DomainRateLimited {
                domain,
                retry_after_secs: denial.retry_after_secs,
            },
        }
    }
}

/// JSON body of every gateway error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    pub kind: ErrorKind,
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

/// Failures while assembling the gateway at startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid outbound header value: {0}")]
    Header(#[from] axum::http::header::InvalidHeaderValue),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures while building the client-side browser.
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("invalid gateway URL: {0}")]
    InvalidGatewayUrl(#[from] url::ParseError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
