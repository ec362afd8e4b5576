//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → wait_for_termination resolves
//!
//! Shutdown (shutdown.rs):
//!     trigger → broadcast → server stops accepting → in-flight requests drain
//! ```
//!
//! # Design Decisions
//! - Startup order lives in main: config, logging, metrics, listener, server
//! - In-flight requests are bounded by the request timeout, so draining ends

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
