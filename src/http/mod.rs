//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, CORS, request id, timeout, trace)
//!     → gateway.rs (admission → cache → upstream fetch → cache write)
//!     → response.rs (mirror upstream or render JSON error)
//!     → Send to client
//! ```

pub mod gateway;
pub mod request;
pub mod response;
pub mod server;

pub use gateway::{Gateway, GatewayOutcome};
pub use request::X_REQUEST_ID;
pub use response::X_RELAY_CACHE;
pub use server::HttpServer;
