//! `WebSocket` handler carrying the session protocol.
//!
//! Each viewer connects to `GET /ws` and gets its own session task. The
//! server speaks first: a [`ServerMessage::ServerPort`] frame confirming
//! the bound port, then [`ServerMessage::DatabasePath`] with the active
//! source's path. After that the session interleaves two streams:
//!
//! - broadcast change notifications from the registry, forwarded verbatim
//! - request/response pairs, handled inline so responses always arrive
//!   in request order within one session
//!
//! If a session falls behind the broadcast channel, lagged messages are
//! silently skipped and it resumes from the most recent notification.

use std::path::Path;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tracing::{debug, warn};

use sqlscope_types::{ClientMessage, ServerMessage, SessionId, SwitchAck};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and run the
/// session protocol on it.
///
/// # Route
///
/// `GET /ws`
pub async fn ws_session(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_session(socket, state))
}

/// Drive one session from handshake to disconnect.
async fn handle_session(mut socket: WebSocket, state: Arc<AppState>) {
    let session = SessionId::new();
    let count = state.session_opened();
    debug!(%session, sessions = count, "viewer connected");

    let mut events = state.registry.subscribe();

    // Server-initiated handshake: bound port first, then the active path.
    // A viewer is Ready once it has seen both.
    let path = state
        .registry
        .current_path()
        .await
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    let handshake = [
        ServerMessage::ServerPort(state.bound_port),
        ServerMessage::DatabasePath(path),
    ];
    for message in &handshake {
        if send_message(&mut socket, message).await.is_err() {
            finish(&state, session);
            return;
        }
    }

    loop {
        tokio::select! {
            // A broadcast change notification from the registry.
            notification = events.recv() => {
                match notification {
                    Ok(message) => {
                        if send_message(&mut socket, &message).await.is_err() {
                            debug!(%session, "viewer disconnected (send failed)");
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        debug!(%session, skipped = n, "session lagged, skipping ahead");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        debug!(%session, "broadcast channel closed, shutting down session");
                        break;
                    }
                }
            }
            // A frame from the viewer.
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_request(&state, text.as_str()).await;
                        if send_message(&mut socket, &reply).await.is_err() {
                            debug!(%session, "viewer disconnected (send failed)");
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(%session, "viewer disconnected");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!(%session, "viewer disconnected (pong failed)");
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        debug!(%session, error = %e, "websocket error");
                        break;
                    }
                    _ => {
                        // Ignore binary and pong frames from the viewer.
                    }
                }
            }
        }
    }

    finish(&state, session);
}

/// Parse and execute one viewer request, always producing a reply frame.
///
/// Failures surface as an `error` event (or a failed switch ack), never
/// as a dropped connection.
async fn handle_request(state: &AppState, text: &str) -> ServerMessage {
    let request: ClientMessage = match serde_json::from_str(text) {
        Ok(request) => request,
        Err(e) => return ServerMessage::Error(format!("malformed request: {e}")),
    };

    match request {
        ClientMessage::GetTables => match state.registry.list_tables().await {
            Ok(tables) => ServerMessage::Tables(tables),
            Err(e) => ServerMessage::Error(format!("failed to get tables: {e}")),
        },
        ClientMessage::GetTableData(name) => match state.registry.snapshot(&name).await {
            Ok(data) => ServerMessage::TableData(data),
            Err(e) => {
                ServerMessage::Error(format!("failed to get data from table {name}: {e}"))
            }
        },
        ClientMessage::ChangeDatabase(path) => {
            match state.registry.switch(Path::new(&path)).await {
                Ok(resolved) => ServerMessage::ChangeDatabaseAck(SwitchAck::ok(
                    resolved.display().to_string(),
                )),
                Err(e) => ServerMessage::ChangeDatabaseAck(SwitchAck::failed(e.to_string())),
            }
        }
    }
}

/// Serialize and send one protocol frame.
async fn send_message(socket: &mut WebSocket, message: &ServerMessage) -> Result<(), axum::Error> {
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "failed to serialize protocol frame");
            return Ok(());
        }
    };
    socket.send(Message::Text(json.into())).await
}

/// Record the session's departure.
fn finish(state: &AppState, session: SessionId) {
    let count = state.session_closed();
    debug!(%session, sessions = count, "session finished");
}
