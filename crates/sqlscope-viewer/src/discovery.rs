//! Endpoint discovery: find a live server among candidate ports.
//!
//! The server binds the first free port of its search range, so the
//! viewer cannot assume a fixed endpoint. Discovery probes candidates
//! **sequentially** -- one bounded handshake attempt at a time -- and
//! adopts the first that answers. The port that last worked (persisted
//! by the viewer) is always probed first.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use crate::error::ViewerError;

/// Upper bound on a single probe's transport handshake.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Fixed delay between automatic reconnection attempts.
pub const RECONNECT_BACKOFF: Duration = Duration::from_secs(3);

/// The connected client-side `WebSocket` stream type.
pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Build the probe order: the previously saved port first (if any),
/// then the configured candidates, de-duplicated.
pub fn probe_order(candidates: &[u16], saved: Option<u16>) -> Vec<u16> {
    let mut order = Vec::with_capacity(candidates.len().saturating_add(1));
    if let Some(port) = saved {
        order.push(port);
    }
    for &port in candidates {
        if !order.contains(&port) {
            order.push(port);
        }
    }
    order
}

/// Probe the candidate endpoints in order and return the first stream
/// that completes a transport handshake, along with the port it was
/// reached on.
///
/// Probes are strictly sequential; a failed or timed-out attempt is
/// closed before the next candidate is tried. Exhaustion surfaces as
/// [`ViewerError::NoServerReachable`] with no automatic retry -- the
/// caller owns that decision.
///
/// # Errors
///
/// Returns [`ViewerError::NoServerReachable`] when every candidate was
/// refused or timed out.
pub async fn connect(
    host: &str,
    candidates: &[u16],
    saved: Option<u16>,
) -> Result<(WsStream, u16), ViewerError> {
    for port in probe_order(candidates, saved) {
        let url = format!("ws://{host}:{port}/ws");
        debug!(%url, "probing candidate endpoint");
        match timeout(PROBE_TIMEOUT, connect_async(url.as_str())).await {
            Ok(Ok((stream, _response))) => {
                info!(host, port, "connected to server");
                return Ok((stream, port));
            }
            Ok(Err(e)) => {
                debug!(port, error = %e, "candidate refused");
            }
            Err(_) => {
                debug!(port, "candidate timed out");
            }
        }
    }

    Err(ViewerError::NoServerReachable)
}
