//! Session protocol message vocabulary.
//!
//! Messages are exchanged over a persistent bidirectional `WebSocket`
//! channel as JSON text frames. Every frame is an adjacently tagged object
//! of the form `{"event": "...", "data": ...}`; unit events omit `data`.
//!
//! The handshake is server-initiated: immediately after the transport
//! opens the server sends [`ServerMessage::ServerPort`] followed by
//! [`ServerMessage::DatabasePath`]. A session is ready for requests once
//! the viewer has seen both.
//!
//! Within one session, responses arrive in request order. Broadcast events
//! ([`ServerMessage::DatabaseChanged`], [`ServerMessage::DatabasePathChanged`])
//! may interleave with responses at any point after the handshake.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A point-in-time, size-bounded, ordered view of one table's rows.
///
/// `columns` preserves the schema declaration order. `rows` are ordered
/// newest-first: by the recognized date-like column when one exists,
/// otherwise by the storage engine's insertion sequence. The row maps key
/// every value by column name; key order inside a map is not significant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TableData {
    /// The table the snapshot was taken from.
    pub name: String,
    /// Column names in schema declaration order.
    pub columns: Vec<String>,
    /// Row records, newest first, at most the requested window size.
    pub rows: Vec<BTreeMap<String, serde_json::Value>>,
}

/// Outcome of a data-source switch request.
///
/// Delivered as the `changeDatabaseAck` event on the session channel, and
/// as the response body of the admin `POST /api/database` surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SwitchAck {
    /// Whether the switch completed.
    pub success: bool,
    /// The resolved absolute path of the new data source, on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Human-readable failure description, on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SwitchAck {
    /// Build a success acknowledgment carrying the resolved path.
    pub fn ok(path: impl Into<String>) -> Self {
        Self {
            success: true,
            path: Some(path.into()),
            message: None,
        }
    }

    /// Build a failure acknowledgment carrying an error description.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            path: None,
            message: Some(message.into()),
        }
    }
}

/// Messages pushed from the server to a viewer session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum ServerMessage {
    /// Confirms the port the server is actually bound to, post-handshake.
    ServerPort(u16),
    /// The currently active data source's resolved path.
    DatabasePath(String),
    /// A switch completed; carries the new resolved path.
    DatabasePathChanged(String),
    /// The active data source's file content changed; viewers should refresh.
    DatabaseChanged,
    /// Result of a table-list request.
    Tables(Vec<String>),
    /// Result of a snapshot request.
    TableData(TableData),
    /// A request-scoped failure description.
    Error(String),
    /// Acknowledgment for a `changeDatabase` request.
    ChangeDatabaseAck(SwitchAck),
}

/// Messages sent from a viewer session to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum ClientMessage {
    /// Request the current table list.
    GetTables,
    /// Request a snapshot of the named table.
    GetTableData(String),
    /// Request a switch to the data source at the given path.
    ChangeDatabase(String),
}
