//! Observer server for the sqlscope live database viewer.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws`) carrying the session protocol:
//!   server-initiated handshake, snapshot requests, and broadcast
//!   refresh signals via [`tokio::sync::broadcast`]
//! - **Admin REST surface** (`GET`/`POST /api/database`) wrapping the
//!   registry's switch operation for one-shot administrative calls
//! - **Minimal HTML status page** (`GET /`) showing the bound port, the
//!   active data source path, and the live session count
//!
//! # Architecture
//!
//! The [`Registry`] is the single owner of the active data source handle.
//! The file watcher and every viewer session run as cooperative tokio
//! tasks; all data-source access funnels through the registry, and change
//! signals fan out to sessions over a broadcast channel with automatic
//! lag handling. Delivery to one slow session never blocks the others.

pub mod config;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use config::Config;
pub use error::{RegistryError, ServerError};
pub use registry::{Registry, RegistryConfig};
pub use router::build_router;
pub use server::{bind_with_search, serve, ServerConfig};
pub use state::AppState;
