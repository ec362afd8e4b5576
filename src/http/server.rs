//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy and info handlers
//! - Wire up middleware (CORS, request ID, trace, timeout)
//! - Identify clients by their socket address
//! - Bind server to listener and drain on shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Query, State},
    http::{HeaderMap, HeaderName},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    cors::CorsLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::clock::SystemClock;
use crate::config::GatewayConfig;
use crate::error::StartupError;
use crate::http::gateway::{Gateway, GatewayOutcome};
use crate::http::request::{request_id, MakeRequestUuidV4, X_REQUEST_ID};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
}

/// Query string of the proxy endpoint.
#[derive(Debug, Deserialize)]
pub struct ProxyParams {
    pub url: Option<String>,
}

/// HTTP server for the relay gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a server whose gateway reads the system clock.
    pub fn new(config: GatewayConfig) -> Result<Self, StartupError> {
        let gateway = Gateway::from_config(&config, Arc::new(SystemClock))?;
        Ok(Self::with_gateway(config, gateway))
    }

    /// Create a server around an already assembled gateway.
    pub fn with_gateway(config: GatewayConfig, gateway: Gateway) -> Self {
        let state = AppState {
            gateway: Arc::new(gateway),
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let x_request_id = HeaderName::from_static(X_REQUEST_ID);

        Router::new()
            .route("/api/proxy", get(proxy_handler))
            .route("/proxy", get(proxy_handler))
            .route("/api", get(info_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuidV4))
            .layer(CorsLayer::permissive())
    }

    /// A clone of the configured router.
    ///
    /// The proxy routes extract `ConnectInfo<SocketAddr>`, so serve it with
    /// `into_make_service_with_connect_info::<SocketAddr>()` or layer a
    /// `MockConnectInfo`; otherwise they answer 500.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            client_max = self.config.admission.client_max,
            domain_max = self.config.admission.domain_max,
            cache_ttl_ms = self.config.cache.ttl_ms,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// `GET /api/proxy?url=` and `GET /proxy?url=`.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(params): Query<ProxyParams>,
) -> Response {
    let start = Instant::now();
    let client_id = addr.ip().to_string();

    let outcome = state.gateway.handle(params.url.as_deref(), &client_id).await;
    let status = outcome.status();

    match &outcome {
        GatewayOutcome::Failed(err) => tracing::info!(
            request_id = %request_id(&headers),
            client = %client_id,
            kind = %err.kind(),
            status = status.as_u16(),
            "Proxy request failed"
        ),
        _ => tracing::debug!(
            request_id = %request_id(&headers),
            client = %client_id,
            outcome = outcome.label(),
            status = status.as_u16(),
            "Proxy request served"
        ),
    }
    metrics::record_request(outcome.label(), status.as_u16(), start);

    outcome.into_response()
}

/// `GET /api`: usage hint.
async fn info_handler() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Relay gateway is running. Use /api/proxy?url=YOUR_URL to proxy requests."
    }))
}
