//! The connection registry: single owner of the active data source.
//!
//! The registry holds the one live [`DataSource`] handle, mediates every
//! switch to a different database file, and fans change notifications out
//! to all sessions. The close-before-open invariant lives here and only
//! here: at no point may two live handles exist in the process.
//!
//! Switches are serialized by holding the registry mutex across the whole
//! operation; a switch request arriving mid-switch queues on the lock.
//! Snapshot and table-list calls clone the pool handle out of the lock
//! and run their queries without it, so a long query never blocks a
//! switch -- instead the switch closes the pool and the in-flight query
//! fails, which callers treat as retryable.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use sqlscope_db::{create_seeded, list_tables, snapshot, DataSource, DEFAULT_ROW_LIMIT};
use sqlscope_types::{ServerMessage, TableData};
use sqlscope_watch::Watcher;

use crate::error::RegistryError;

/// Capacity of the broadcast channel for change notifications.
///
/// A subscriber that falls more than this many messages behind receives
/// a lag error and skips to the newest message.
const BROADCAST_CAPACITY: usize = 256;

/// Default poll interval for the file watcher.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Tuning knobs for the registry.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// How often the watcher polls the active file's modification time.
    pub poll_interval: Duration,
    /// Row window size for snapshot requests.
    pub row_limit: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            row_limit: DEFAULT_ROW_LIMIT,
        }
    }
}

/// The live data source plus the tasks observing it.
///
/// Torn down as a unit: watcher first, then the pool, so no change event
/// can fire against an already-closed handle.
struct ActiveSource {
    source: DataSource,
    watcher: Watcher,
    forward: JoinHandle<()>,
}

impl ActiveSource {
    async fn shutdown(self) {
        self.watcher.stop();
        self.forward.abort();
        self.source.close().await;
    }
}

/// Single owner of the active data source and broadcaster of change
/// signals to all sessions.
pub struct Registry {
    config: RegistryConfig,
    active: Mutex<Option<ActiveSource>>,
    events: broadcast::Sender<ServerMessage>,
}

impl Registry {
    /// Create a registry with no active data source.
    pub fn new(config: RegistryConfig) -> Self {
        let (events, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            config,
            active: Mutex::new(None),
            events,
        }
    }

    /// Subscribe to change notifications.
    ///
    /// The receiver yields [`ServerMessage::DatabaseChanged`] and
    /// [`ServerMessage::DatabasePathChanged`] events. Sessions forward
    /// them to their viewers verbatim.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.events.subscribe()
    }

    /// The resolved path of the active data source, if any.
    pub async fn current_path(&self) -> Option<PathBuf> {
        let active = self.active.lock().await;
        active.as_ref().map(|a| a.source.path().to_path_buf())
    }

    /// List the active source's user tables.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NoActiveDataSource`] when nothing is connected,
    /// [`RegistryError::Db`] when the catalog read fails.
    pub async fn list_tables(&self) -> Result<Vec<String>, RegistryError> {
        let source = self.active_source().await?;
        Ok(list_tables(source.pool()).await?)
    }

    /// Take a snapshot of `table` against the active source, windowed to
    /// the configured row limit.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NoActiveDataSource`] when nothing is connected,
    /// [`RegistryError::Db`] for identifier, lookup, and read failures.
    pub async fn snapshot(&self, table: &str) -> Result<TableData, RegistryError> {
        let source = self.active_source().await?;
        Ok(snapshot(source.pool(), table, self.config.row_limit).await?)
    }

    /// Switch the active data source to the database file at `requested`.
    ///
    /// Steps, in order: resolve to an absolute path, verify the parent
    /// directory exists, seed the file if it does not exist yet, close
    /// the previous source, open the new one, start its watcher, then
    /// broadcast `databasePathChanged` and `databaseChanged` to every
    /// session.
    ///
    /// A failure before the close leaves the previous source untouched.
    /// A failure to open the new source after the close leaves the
    /// registry with no active source at all; subsequent calls get
    /// [`RegistryError::NoActiveDataSource`] until a later switch
    /// succeeds.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DirectoryNotFound`] when the parent directory is
    /// missing, [`RegistryError::Db`] when seeding fails,
    /// [`RegistryError::SwitchFailed`] when the new source cannot be
    /// opened.
    pub async fn switch(&self, requested: &Path) -> Result<PathBuf, RegistryError> {
        // Lock held across the whole switch: concurrent requests queue here
        // and never interleave.
        let mut active = self.active.lock().await;

        let resolved = std::path::absolute(requested).map_err(|e| {
            RegistryError::SwitchFailed(format!(
                "cannot resolve {}: {e}",
                requested.display()
            ))
        })?;

        match resolved.parent() {
            Some(dir) if dir.is_dir() => {}
            _ => {
                let dir = resolved.parent().unwrap_or(&resolved);
                return Err(RegistryError::DirectoryNotFound(dir.display().to_string()));
            }
        }

        if !resolved.exists() {
            create_seeded(&resolved).await?;
        }

        // Close-before-open: the previous handle and its watcher are gone
        // before the new handle exists.
        if let Some(previous) = active.take() {
            debug!(path = %previous.source.path().display(), "closing previous data source");
            previous.shutdown().await;
        }

        let source = DataSource::open(&resolved).await.map_err(|e| {
            RegistryError::SwitchFailed(format!("cannot open {}: {e}", resolved.display()))
        })?;

        let (tx, mut rx) = mpsc::channel(8);
        let watcher = Watcher::start(resolved.clone(), self.config.poll_interval, tx);
        let events = self.events.clone();
        let forward = tokio::spawn(async move {
            while rx.recv().await.is_some() {
                // send fails only with zero subscribers, which is normal.
                let _ = events.send(ServerMessage::DatabaseChanged);
            }
        });

        *active = Some(ActiveSource {
            source,
            watcher,
            forward,
        });
        drop(active);

        let path_string = resolved.display().to_string();
        let _ = self
            .events
            .send(ServerMessage::DatabasePathChanged(path_string));
        let _ = self.events.send(ServerMessage::DatabaseChanged);

        info!(path = %resolved.display(), "data source switched");
        Ok(resolved)
    }

    /// Clone the active source handle out of the lock, or fail.
    ///
    /// Queries run against the clone without holding the lock, so a
    /// switch can proceed concurrently (and fail the query by closing
    /// the shared pool underneath it).
    async fn active_source(&self) -> Result<DataSource, RegistryError> {
        let active = self.active.lock().await;
        active
            .as_ref()
            .map(|a| a.source.clone())
            .ok_or(RegistryError::NoActiveDataSource)
    }
}
