//! Outbound fetching subsystem.
//!
//! # Data Flow
//! ```text
//! target URL
//!     → fetcher.rs (validate, attach browser headers, send with timeout)
//!     → classify.rs (status and transport failures → FetchFailure)
//!     → UpstreamResponse { status, payload, content type } or FetchFailure
//! ```
//!
//! # Design Decisions
//! - Statuses below 500 other than 429 are deliverable and pass through untouched
//! - The gateway never retries upstream; retry policy belongs to the client
//! - Every fetch is bounded by the client timeout, even if the caller hangs up

pub mod classify;
pub mod fetcher;

pub use classify::FetchFailure;
pub use fetcher::{Fetcher, HttpFetcher, UpstreamResponse};
