//! Download daemon (tunegrab-dl) - Main entry point
//!
//! Establishes the peer-gateway session, wires up the download engine and
//! progress bus, and serves the HTTP/SSE control interface.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tunegrab_common::config::Config;
use tunegrab_common::events::ProgressBus;

use tunegrab_dl::api;
use tunegrab_dl::download::Orchestrator;
use tunegrab_dl::net::{Disconnected, GatewayClient, PeerNetwork};
use tunegrab_dl::state::SharedState;
use tunegrab_dl::AppContext;

/// Command-line arguments for tunegrab-dl
#[derive(Parser, Debug)]
#[command(name = "tunegrab-dl")]
#[command(about = "Peer-to-peer audio download daemon")]
#[command(version)]
struct Args {
    /// Path to a TOML config file (platform config dir is searched otherwise)
    #[arg(short, long, env = "TUNEGRAB_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "TUNEGRAB_PORT")]
    port: Option<u16>,

    /// Base URL of the peer-gateway daemon
    #[arg(short, long, env = "TUNEGRAB_GATEWAY_URL")]
    gateway_url: Option<String>,

    /// Folder completed downloads are written to
    #[arg(short, long, env = "TUNEGRAB_DOWNLOAD_DIR")]
    download_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tunegrab_dl=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    // Command-line and environment overrides win over the config file
    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(gateway_url) = args.gateway_url {
        config.gateway_url = gateway_url;
    }
    if let Some(download_dir) = args.download_dir {
        config.download_dir = download_dir;
    }

    info!("Starting tunegrab download daemon on port {}", config.port);
    info!("Download folder: {}", config.download_dir.display());

    // Establish the single gateway session. On failure the server still
    // comes up, but every network operation reports "not connected" instead
    // of hanging.
    let (network, connected): (Arc<dyn PeerNetwork>, bool) =
        match GatewayClient::connect(&config).await {
            Ok(client) => (Arc::new(client), true),
            Err(err) => {
                warn!(
                    "Could not establish gateway session ({}); serving in disconnected state",
                    err
                );
                (Arc::new(Disconnected), false)
            }
        };

    let bus = ProgressBus::new(config.event_capacity);
    let orchestrator = Arc::new(Orchestrator::new(network, bus.clone(), &config));

    let ctx = AppContext {
        state: Arc::new(SharedState::new(bus)),
        orchestrator,
        connected,
        port: config.port,
    };

    let app = api::create_router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
