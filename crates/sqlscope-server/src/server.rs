//! Observer server lifecycle: port search, bind, serve.
//!
//! The configured port may already be taken by a previous instance that
//! has not finished shutting down, or by an unrelated process. Rather
//! than failing outright, [`bind_with_search`] probes upward from the
//! configured port one at a time for a bounded number of attempts. The
//! port actually bound is announced to every session during its
//! handshake, which is how viewers re-find the server after a restart
//! lands on a different port.

use axum::Router;
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::error::ServerError;

/// Configuration for the observer server's listener.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The host address to bind to (e.g. `127.0.0.1`).
    pub host: String,
    /// The preferred TCP port; the search starts here.
    pub port: u16,
    /// How many consecutive ports to try before giving up.
    pub port_attempts: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("127.0.0.1"),
            port: 4000,
            port_attempts: 10,
        }
    }
}

/// Bind a TCP listener, probing upward from the configured port.
///
/// Returns the listener together with the port it actually bound.
/// Exhausting the whole range is the one startup error this subsystem
/// treats as fatal.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if no port in the range could be bound.
pub async fn bind_with_search(config: &ServerConfig) -> Result<(TcpListener, u16), ServerError> {
    for offset in 0..config.port_attempts {
        let Some(port) = config.port.checked_add(offset) else {
            break;
        };
        let addr = format!("{}:{}", config.host, port);
        match TcpListener::bind(&addr).await {
            Ok(listener) => {
                if offset > 0 {
                    info!(
                        preferred = config.port,
                        bound = port,
                        "preferred port occupied, bound further up the range"
                    );
                }
                return Ok((listener, port));
            }
            Err(e) => {
                debug!(port, error = %e, "port unavailable, trying next");
            }
        }
    }

    Err(ServerError::Bind(format!(
        "no free port on {} in range {}..{}",
        config.host,
        config.port,
        u32::from(config.port).saturating_add(u32::from(config.port_attempts)),
    )))
}

/// Run the Axum server on an already-bound listener until it exits.
///
/// # Errors
///
/// Returns [`ServerError::Serve`] if the server encounters a fatal I/O
/// error.
pub async fn serve(listener: TcpListener, router: Router) -> Result<(), ServerError> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "observer server listening");
    }
    axum::serve(listener, router)
        .await
        .map_err(|e| ServerError::Serve(format!("serve error: {e}")))
}
