//! Observer server binary for sqlscope.
//!
//! Wires together the connection registry, the file watcher, and the
//! HTTP/`WebSocket` server. Loads configuration, opens (or seeds) the
//! initial data source, binds a port from the search range, and serves
//! until terminated.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from the environment
//! 3. Create the connection registry and switch to the initial data
//!    source (a failure here degrades, it does not abort)
//! 4. Bind a listener, probing upward from the preferred port
//! 5. Serve the router

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sqlscope_server::{
    bind_with_search, build_router, serve, AppState, Config, Registry, RegistryConfig,
    ServerConfig,
};

/// Application entry point for the observer server.
///
/// # Errors
///
/// Returns an error if configuration parsing fails or no port in the
/// search range can be bound.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("sqlscope-server starting");

    // 2. Load configuration.
    let config = Config::from_env()?;
    info!(
        db_path = %config.db_path.display(),
        host = config.host.as_str(),
        port = config.port,
        port_attempts = config.port_attempts,
        poll_interval = ?config.poll_interval,
        row_limit = config.row_limit,
        "Configuration loaded"
    );

    // 3. Create the registry and open the initial data source. Anything
    //    short of port exhaustion is non-fatal: a failed initial switch
    //    leaves the registry degraded and a later switch can recover it.
    let registry = Arc::new(Registry::new(RegistryConfig {
        poll_interval: config.poll_interval,
        row_limit: config.row_limit,
    }));

    match registry.switch(&config.db_path).await {
        Ok(resolved) => info!(path = %resolved.display(), "initial data source opened"),
        Err(e) => error!(
            error = %e,
            path = %config.db_path.display(),
            "could not open initial data source, starting without one"
        ),
    }

    // 4. Bind a listener from the port search range.
    let server_config = ServerConfig {
        host: config.host,
        port: config.port,
        port_attempts: config.port_attempts,
    };
    let (listener, bound_port) = bind_with_search(&server_config).await?;

    // 5. Serve.
    let state = Arc::new(AppState::new(registry, bound_port));
    let router = build_router(state);
    serve(listener, router).await?;

    Ok(())
}
