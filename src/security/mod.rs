//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming proxy request:
//!     → rate_limit.rs (per-client window, then per-(client, domain) window)
//!     → [cache / upstream fetch]
//!
//! Outgoing upstream request:
//!     → headers.rs (browser-like headers, rotated user agent)
//! ```
//!
//! # Design Decisions
//! - Admission runs before anything else touches the request
//! - No trust in client input: malformed targets skip the domain window
//!   but still pay the client window

pub mod headers;
pub mod rate_limit;
