//! Error types for the observer server.
//!
//! [`RegistryError`] covers everything a session request can fail with;
//! it surfaces to viewers as an `error` event (or a failed switch ack),
//! never as a crashed process. [`ServerError`] covers the startup path,
//! where an unbindable port range is the one genuinely fatal condition.

use sqlscope_db::DbError;

/// Errors that can occur in the connection registry and request handling.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No data source is currently connected.
    ///
    /// This is the degraded state after a switch that closed the old
    /// handle and then failed to open the new one.
    #[error("no active data source")]
    NoActiveDataSource,

    /// The parent directory of a requested data source path does not
    /// exist. Directories are never auto-created.
    #[error("directory not found: {0}")]
    DirectoryNotFound(String),

    /// A data-source switch failed after validation.
    #[error("switch failed: {0}")]
    SwitchFailed(String),

    /// A data-layer operation failed.
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Errors that can occur when starting or running the observer server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind any port in the configured search range.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),

    /// A configuration value could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}
