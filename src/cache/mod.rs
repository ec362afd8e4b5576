//! Short-lived response caching.
//!
//! # Data Flow
//! ```text
//! proxy request
//!     → response.rs lookup (fresh entry? replay it)
//!     → upstream fetch on miss
//!     → response.rs store (2xx only)
//! ```
//!
//! # Design Decisions
//! - Keys are the raw target URL string, no normalization
//! - Bounded by a lazy sweep rather than an eviction policy

pub mod response;

pub use response::{CacheEntry, ResponseCache};
