//! Relay gateway.
//!
//! Fetches third-party pages on behalf of a browser-embedded client so the
//! client is not subject to the origin's CORS or framing rules.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌───────────────────────────────────────────────┐
//!                         │                 RELAY GATEWAY                  │
//!   GET /api/proxy?url=   │  ┌──────────┐   ┌──────────┐   ┌───────────┐  │
//!   ──────────────────────┼─▶│admission │──▶│ response │──▶│ upstream  │──┼──▶ Origin
//!                         │  │ windows  │   │  cache   │   │  fetcher  │  │
//!                         │  └────┬─────┘   └────┬─────┘   └─────┬─────┘  │
//!                         │       │ 429          │ hit           │        │
//!   ◀─────────────────────┼───────┴──────────────┴───────────────┘        │
//!   payload or JSON error │                                               │
//!                         │  config · observability · lifecycle           │
//!                         └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use relay_gateway::config::loader::load_or_default;
use relay_gateway::observability::{logging, metrics};
use relay_gateway::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "relay-gateway")]
#[command(about = "CORS-shielding fetch gateway", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_or_default(cli.config.as_deref())?;

    logging::init_logging(&config.observability);
    tracing::info!("relay-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        client_max = config.admission.client_max,
        domain_max = config.admission.domain_max,
        window_ms = config.admission.window_ms,
        upstream_timeout_secs = config.upstream.timeout_secs,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
