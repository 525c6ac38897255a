//! REST endpoint handlers for the observer server.
//!
//! The admin surface is a thin request/response wrapper over the same
//! registry switch operation the session protocol exposes, for one-shot
//! administrative calls outside the persistent channel.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/database` | Current resolved data source path |
//! | `POST` | `/api/database` | Switch the active data source |

use std::path::Path;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::Json;

use sqlscope_types::SwitchAck;

use crate::state::AppState;

/// Request body for the `POST /api/database` endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct ChangeDatabaseRequest {
    /// Path of the database file to switch to; relative paths resolve
    /// against the server process's working directory.
    #[serde(rename = "dbPath")]
    pub db_path: String,
}

/// Serve a minimal HTML page showing server status.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let path = state
        .registry
        .current_path()
        .await
        .map_or_else(|| String::from("(none)"), |p| p.display().to_string());
    let sessions = state.session_count();
    let port = state.bound_port;

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>sqlscope</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
        }}
        h1 {{ color: #58a6ff; }}
        td {{ padding: 0.25rem 1rem 0.25rem 0; }}
        a {{ color: #58a6ff; }}
    </style>
</head>
<body>
    <h1>sqlscope</h1>
    <table>
        <tr><td>port</td><td>{port}</td></tr>
        <tr><td>database</td><td>{path}</td></tr>
        <tr><td>sessions</td><td>{sessions}</td></tr>
    </table>
    <p><a href="/api/database">/api/database</a> &middot; <code>/ws</code></p>
</body>
</html>"#
    ))
}

/// Return the current resolved data source path.
///
/// # Route
///
/// `GET /api/database` -- responds `{"path": "..."}`, with `null` when
/// the registry is in the degraded no-data-source state.
pub async fn get_database(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let path = state
        .registry
        .current_path()
        .await
        .map(|p| p.display().to_string());
    Json(serde_json::json!({ "path": path }))
}

/// Switch the active data source.
///
/// # Route
///
/// `POST /api/database` with body `{"dbPath": "..."}`. Responds with the
/// same ack shape the session protocol uses: `{success, path}` on
/// success, `{success: false, message}` with a 400 status on failure.
pub async fn change_database(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChangeDatabaseRequest>,
) -> impl IntoResponse {
    match state.registry.switch(Path::new(&request.db_path)).await {
        Ok(resolved) => (
            StatusCode::OK,
            Json(SwitchAck::ok(resolved.display().to_string())),
        ),
        Err(e) => (StatusCode::BAD_REQUEST, Json(SwitchAck::failed(e.to_string()))),
    }
}
