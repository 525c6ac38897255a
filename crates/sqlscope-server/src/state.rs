//! Shared application state for the observer server.
//!
//! [`AppState`] ties the connection registry to the HTTP layer: every
//! handler and every `WebSocket` session reaches the registry through it.
//! It also tracks the live session count for the status page and knows
//! the port the listener actually bound to, which sessions announce
//! during their handshake.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::registry::Registry;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
pub struct AppState {
    /// The connection registry owning the active data source.
    pub registry: Arc<Registry>,
    /// The port the TCP listener actually bound to (after port search).
    pub bound_port: u16,
    /// Number of currently connected viewer sessions.
    sessions: AtomicUsize,
}

impl AppState {
    /// Create application state around a registry and the bound port.
    pub fn new(registry: Arc<Registry>, bound_port: u16) -> Self {
        Self {
            registry,
            bound_port,
            sessions: AtomicUsize::new(0),
        }
    }

    /// Record a newly connected session; returns the new session count.
    pub fn session_opened(&self) -> usize {
        self.sessions.fetch_add(1, Ordering::Relaxed).saturating_add(1)
    }

    /// Record a disconnected session; returns the new session count.
    pub fn session_closed(&self) -> usize {
        self.sessions.fetch_sub(1, Ordering::Relaxed).saturating_sub(1)
    }

    /// Number of currently connected sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.load(Ordering::Relaxed)
    }
}
