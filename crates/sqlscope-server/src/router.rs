//! Axum router construction for the observer server.
//!
//! Assembles all routes (status page, admin REST, `WebSocket`) into a
//! single [`Router`] with CORS middleware enabled so browser-hosted
//! dashboards on other origins can connect.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the observer server.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /ws` -- the session protocol `WebSocket`
/// - `GET /api/database` -- current resolved data source path
/// - `POST /api/database` -- switch the active data source
///
/// CORS is configured to allow any origin for development. In
/// production this should be restricted.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // WebSocket session protocol
        .route("/ws", get(ws::ws_session))
        // Admin REST surface
        .route(
            "/api/database",
            get(handlers::get_database).post(handlers::change_database),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
