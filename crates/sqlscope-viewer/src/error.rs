//! Error types for the viewer client.

/// Errors that can occur on the viewer side.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    /// Every candidate endpoint was probed and none accepted a
    /// connection. The caller decides whether to try again.
    #[error("no server reachable on any candidate port")]
    NoServerReachable,

    /// An established connection dropped or errored mid-session.
    #[error("transport lost: {0}")]
    TransportLost(String),

    /// The server closed or misbehaved before announcing its identity.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// A `WebSocket` operation failed.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Reading or writing the persisted viewer state failed.
    #[error("state persistence error: {0}")]
    Persist(#[from] std::io::Error),

    /// A protocol frame could not be serialized or parsed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An admin REST call failed at the HTTP layer.
    #[error("admin request failed: {0}")]
    Admin(#[from] reqwest::Error),

    /// The server answered a request with a request-scoped failure.
    #[error("server error: {0}")]
    Server(String),

    /// The background session runner is gone, so no requests can be sent.
    #[error("session runner stopped")]
    RunnerStopped,
}
