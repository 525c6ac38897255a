//! The per-connection session protocol state machine.
//!
//! A session moves one way through
//! `Connecting -> Handshaking -> Ready -> Disconnected`; the only loop
//! back is `Disconnected -> Connecting`, and that always builds a fresh
//! [`Session`] -- an old session object is never re-handshaken.
//!
//! The server speaks first: it announces the port it is actually bound
//! to, then the active data source's path. The session records both and
//! is `Ready` for requests once it has seen them.

use futures::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace};

use sqlscope_types::{ClientMessage, ServerMessage};

use crate::discovery::WsStream;
use crate::error::ViewerError;

/// Where a session is in its one-directional lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// A transport attempt is in flight (discovery side).
    Connecting,
    /// The transport is open; the server has not yet confirmed its
    /// identity.
    Handshaking,
    /// The server announced its bound port and active path; requests may
    /// be issued.
    Ready,
    /// The transport is gone; in-flight requests are abandoned and must
    /// be re-issued on the next `Ready` session.
    Disconnected,
}

/// One live connection to the server, from handshake to disconnect.
#[derive(Debug)]
pub struct Session {
    ws: WsStream,
    state: SessionState,
    server_port: Option<u16>,
    database_path: Option<String>,
}

impl Session {
    /// Wrap a freshly connected transport; the session starts in
    /// [`SessionState::Handshaking`].
    pub const fn new(ws: WsStream) -> Self {
        Self {
            ws,
            state: SessionState::Handshaking,
            server_port: None,
            database_path: None,
        }
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// The port the server confirmed it is bound to, once known.
    ///
    /// This is the value the viewer persists as the next discovery seed.
    pub const fn server_port(&self) -> Option<u16> {
        self.server_port
    }

    /// The active data source path as last announced by the server.
    pub fn database_path(&self) -> Option<&str> {
        self.database_path.as_deref()
    }

    /// Drive the session until the server has announced both its bound
    /// port and the active data source path, then become `Ready`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::Handshake`] if the connection closes before
    /// the identity announcement completes, or a transport error.
    pub async fn complete_handshake(&mut self) -> Result<(), ViewerError> {
        while self.server_port.is_none() || self.database_path.is_none() {
            match self.recv().await? {
                Some(message) => trace!(?message, "handshake frame"),
                None => {
                    return Err(ViewerError::Handshake(String::from(
                        "connection closed before the server announced itself",
                    )))
                }
            }
        }
        self.state = SessionState::Ready;
        debug!(
            port = self.server_port,
            path = self.database_path.as_deref().unwrap_or_default(),
            "session ready"
        );
        Ok(())
    }

    /// Send one request frame.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the frame cannot be written.
    pub async fn send(&mut self, request: &ClientMessage) -> Result<(), ViewerError> {
        let json = serde_json::to_string(request)?;
        self.ws.send(Message::Text(json.into())).await?;
        Ok(())
    }

    /// Receive the next protocol frame, or `None` once the server closes
    /// the connection.
    ///
    /// Port and path announcements (including later
    /// [`ServerMessage::DatabasePathChanged`] broadcasts) are absorbed
    /// into the session's identity fields before being returned.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::TransportLost`] on a mid-session transport
    /// failure; the session is `Disconnected` afterwards either way.
    pub async fn recv(&mut self) -> Result<Option<ServerMessage>, ViewerError> {
        loop {
            match self.ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    let message: ServerMessage = serde_json::from_str(text.as_str())?;
                    self.absorb(&message);
                    return Ok(Some(message));
                }
                Some(Ok(Message::Close(_))) | None => {
                    self.state = SessionState::Disconnected;
                    return Ok(None);
                }
                Some(Ok(_)) => {
                    // Ping/pong is handled by the transport; binary frames
                    // are not part of the protocol.
                }
                Some(Err(e)) => {
                    self.state = SessionState::Disconnected;
                    return Err(ViewerError::TransportLost(e.to_string()));
                }
            }
        }
    }

    /// Send a table-list request and wait for its response, passing over
    /// any interleaved broadcast frames.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::Server`] when the server answers with a
    /// request-scoped failure, and [`ViewerError::TransportLost`] if the
    /// connection drops before the response arrives.
    pub async fn request_tables(&mut self) -> Result<Vec<String>, ViewerError> {
        self.send(&ClientMessage::GetTables).await?;
        loop {
            match self.recv().await? {
                Some(ServerMessage::Tables(tables)) => return Ok(tables),
                Some(ServerMessage::Error(message)) => return Err(ViewerError::Server(message)),
                Some(other) => trace!(?other, "frame passed over while awaiting tables"),
                None => {
                    return Err(ViewerError::TransportLost(String::from(
                        "connection closed while awaiting tables",
                    )))
                }
            }
        }
    }

    /// Send a snapshot request for `table` and wait for its response,
    /// passing over any interleaved broadcast frames.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Session::request_tables`].
    pub async fn request_table_data(
        &mut self,
        table: &str,
    ) -> Result<sqlscope_types::TableData, ViewerError> {
        self.send(&ClientMessage::GetTableData(table.to_owned())).await?;
        loop {
            match self.recv().await? {
                Some(ServerMessage::TableData(data)) => return Ok(data),
                Some(ServerMessage::Error(message)) => return Err(ViewerError::Server(message)),
                Some(other) => trace!(?other, "frame passed over while awaiting table data"),
                None => {
                    return Err(ViewerError::TransportLost(String::from(
                        "connection closed while awaiting table data",
                    )))
                }
            }
        }
    }

    /// Record identity announcements carried by a frame.
    fn absorb(&mut self, message: &ServerMessage) {
        match message {
            ServerMessage::ServerPort(port) => self.server_port = Some(*port),
            ServerMessage::DatabasePath(path)
            | ServerMessage::DatabasePathChanged(path) => {
                self.database_path = Some(path.clone());
            }
            _ => {}
        }
    }
}
