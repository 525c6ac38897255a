//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`]. Underlying read failures are
//! wrapped rather than exposed raw so callers can treat any engine-level
//! failure as a retryable query error.

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A table identifier contained characters outside `[A-Za-z0-9_]`.
    ///
    /// Raised before any schema or data access happens, so a hostile name
    /// never reaches a constructed query.
    #[error("invalid table identifier: {0:?}")]
    InvalidIdentifier(String),

    /// The named table has no columns, i.e. it does not exist.
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// An underlying SQLite read or open operation failed.
    #[error("query failed: {0}")]
    QueryFailed(#[from] sqlx::Error),
}
