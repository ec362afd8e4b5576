//! CORS-shielding fetch gateway and its navigation client.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod navigation;
pub mod observability;
pub mod resilience;
pub mod security;
pub mod store;
pub mod upstream;

pub use config::schema::GatewayConfig;
pub use error::{ErrorBody, ErrorKind, GatewayError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use navigation::{Browser, NavigationEngine};
