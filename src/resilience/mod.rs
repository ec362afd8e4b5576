//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Failed load in the navigation engine:
//!     → retries.rs (classify: backoff, cooldown or give up)
//!     → backoff.rs (compute the delay)
//!     → scheduler fires the retry
//! ```
//!
//! # Design Decisions
//! - The gateway never retries upstream; all retry policy lives client-side
//! - Backoff is deterministic so the retry schedule is testable
//! - Every delay is capped

pub mod backoff;
pub mod retries;

pub use retries::{RetryDecision, RetryPolicy};
