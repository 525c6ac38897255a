//! Read-only connection handle to one SQLite database file.
//!
//! The observer never writes to the observed file, so the pool is opened
//! in read-only mode. External writers (the processes that actually own
//! the database) remain free to mutate it underneath us; the watcher
//! notices and snapshots are re-queried.

use std::path::{Path, PathBuf};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::error::DbError;

/// Maximum number of connections in the read pool.
///
/// Snapshot queries are short and serialized per session, so a small pool
/// is plenty.
const MAX_CONNECTIONS: u32 = 4;

/// Read-only pool handle to one database file.
///
/// Cloning is cheap (the pool is internally shared). Exclusive ownership
/// of the *live* handle rests with the connection registry: it opens a
/// source, hands out clones for individual queries, and is the only
/// component that may close it.
#[derive(Clone)]
pub struct DataSource {
    path: PathBuf,
    pool: SqlitePool,
}

impl DataSource {
    /// Open a read-only pool on the database file at `path`.
    ///
    /// The file must already exist; a missing path is an open error, not a
    /// creation request (see [`crate::bootstrap`] for seeding new files).
    ///
    /// # Errors
    ///
    /// Returns [`DbError::QueryFailed`] if the file cannot be opened.
    pub async fn open(path: &Path) -> Result<Self, DbError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        tracing::info!(path = %path.display(), "data source opened read-only");

        Ok(Self {
            path: path.to_path_buf(),
            pool,
        })
    }

    /// The absolute path this source reads from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return a reference to the underlying [`SqlitePool`].
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close all connections in the pool.
    ///
    /// In-flight queries on other clones fail once the pool closes; the
    /// registry relies on this when switching sources mid-query.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!(path = %self.path.display(), "data source closed");
    }
}
