//! Chainwatch daemon binary.
//!
//! This is the main entry point that wires together the JSON-RPC ledger
//! client, the watcher facade with its background refresh loop, and the
//! HTTP API server. It runs until the process receives Ctrl-C, then
//! stops the refresh loop cleanly.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `chainwatch.yaml`
//! 3. Create the JSON-RPC ledger client
//! 4. Create the watcher and start the refresh loop
//! 5. Serve the HTTP API until a shutdown signal arrives
//! 6. Stop the refresh loop and exit

mod config;

use std::path::Path;
use std::sync::Arc;

use chainwatch_api::server::start_server;
use chainwatch_api::state::AppState;
use chainwatch_core::{Watcher, WatcherConfig};
use chainwatch_rpc::RpcClient;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, DaemonConfig};

/// Application entry point for the daemon.
///
/// Initializes all subsystems and serves the HTTP API until a shutdown
/// signal arrives.
///
/// # Errors
///
/// Returns an error if configuration loading or the HTTP server fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("chainwatch starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        endpoint = config.rpc.endpoint,
        request_timeout_ms = config.rpc.request_timeout_ms,
        refresh_interval_secs = config.watcher.refresh_interval_secs,
        host = config.server.host,
        port = config.server.port,
        "configuration loaded"
    );

    // 3. Create the JSON-RPC ledger client.
    let client = RpcClient::new(config.rpc.endpoint.as_str(), config.rpc.request_timeout());

    // 4. Create the watcher and start the refresh loop.
    let watcher = Arc::new(Watcher::new(
        Arc::new(client),
        WatcherConfig {
            refresh_interval: config.watcher.refresh_interval(),
        },
    ));
    watcher.start().await;

    // 5. Serve the HTTP API until a shutdown signal arrives.
    let state = Arc::new(AppState::new(Arc::clone(&watcher)));
    let server_config = chainwatch_api::ServerConfig {
        host: config.server.host,
        port: config.server.port,
    };
    start_server(&server_config, state, shutdown_signal()).await?;

    // 6. Stop the refresh loop.
    watcher.shutdown().await;

    info!("chainwatch shutdown complete");

    Ok(())
}

/// Resolve when the process receives Ctrl-C.
///
/// If the signal listener cannot be installed the future never
/// resolves, so the server keeps serving instead of shutting down on
/// the spot.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            error!(error = %e, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}

/// Load the daemon configuration from `chainwatch.yaml`.
///
/// Looks for the config file relative to the current working directory.
/// Environment overrides apply whether or not the file exists.
fn load_config() -> Result<DaemonConfig, ConfigError> {
    let config_path = Path::new("chainwatch.yaml");
    if config_path.exists() {
        DaemonConfig::from_file(config_path)
    } else {
        info!("config file not found, using defaults");
        let mut config = DaemonConfig::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}
