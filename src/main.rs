//! Header-routed HTTP forwarding gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────┐
//!                         │                 ENDPOINT GATEWAY                 │
//!                         │                                                  │
//!   Client Request        │  ┌──────────┐    ┌────────────┐    ┌──────────┐  │
//!   ──────────────────────┼─▶│   http   │───▶│  routing   │───▶│forwarding│  │
//!                         │  │  server  │    │  resolver  │    │  engine  │  │
//!                         │  └──────────┘    └────────────┘    └────┬─────┘  │
//!                         │                                         │        │
//!   Client Response       │                                    ┌────▼─────┐  │
//!   ◀─────────────────────┼────────────────────────────────────│transport │◀─┼── Target
//!                         │                                    └──────────┘  │
//!                         │  ┌────────┐ ┌───────────────┐ ┌───────────────┐  │
//!                         │  │ config │ │ observability │ │   lifecycle   │  │
//!                         │  └────────┘ └───────────────┘ └───────────────┘  │
//!                         └──────────────────────────────────────────────────┘
//! ```
//!
//! The target of each request comes from the endpoint header; requests
//! without one go to the fallback origin.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use endpoint_gateway::config::load_config;
use endpoint_gateway::http::HttpServer;
use endpoint_gateway::lifecycle::{wait_for_signal, Shutdown};
use endpoint_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "endpoint-gateway")]
#[command(about = "Forward each request to the endpoint named in its headers", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Listen port. Overrides the config file and `PORT`.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.listener.port = port;
    }

    logging::init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config_file = ?cli.config,
        fallback_origin = %config.routing.fallback_origin,
        endpoint_header = %config.routing.endpoint_header,
        "endpoint-gateway starting"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening on port {}", local_addr.port());

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    let server = HttpServer::new(config)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
