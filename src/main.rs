//! API gateway service.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌───────────────────────────────────────────────────┐
//!                     │                      GATEWAY                      │
//!                     │                                                   │
//!   Dispatcher ───────┼─▶ find_route ──▶ RouteTable (priority, matchers) │
//!                     │        │                                          │
//!                     │        ▼                                          │
//!                     │  select_service ──▶ LoadBalancer ──▶ Registry    │
//!                     │        │                              ▲           │
//!                     │        ▼                              │           │
//!                     │  record_request ──▶ MetricsCollector  │           │
//!                     │                                       │           │
//!                     │                   HealthMonitor ──────┘           │
//!                     │                   (periodic probes)               │
//!                     └───────────────────────────────────────────────────┘
//! ```
//!
//! This binary loads the configuration, bootstraps services and routes,
//! runs the health monitor and serves the read-only admin API until Ctrl+C.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use api_gateway::admin::setup_admin_router;
use api_gateway::config::loader::load_config;
use api_gateway::observability::{logging, metrics};
use api_gateway::{Gateway, GatewayConfig};

#[derive(Parser)]
#[command(name = "api-gateway")]
#[command(about = "API gateway: routing, load balancing and health checking", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured log level (e.g. "debug").
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(level) = args.log_level {
        config.observability.log_level = level;
    }

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "api-gateway starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let gateway = Arc::new(Gateway::from_config(&config)?);
    tracing::info!(
        services = config.services.len(),
        routes = config.routes.len(),
        "Configuration loaded"
    );

    if config.admin.enabled {
        let router = setup_admin_router(gateway.clone(), &config.admin.api_key).layer(TraceLayer::new_for_http());
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        tracing::info!(address = %listener.local_addr()?, "Admin API listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
    } else {
        shutdown_signal().await;
    }

    gateway.stop();
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
    }
    tracing::info!("Shutdown signal received");
}
