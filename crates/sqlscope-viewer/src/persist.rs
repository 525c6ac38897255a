//! Locally persisted viewer state.
//!
//! The viewer remembers the last endpoint that worked and the last data
//! source path it saw, and reuses them across restarts: the saved port
//! seeds the next discovery pass. The state lives in a small JSON file
//! under the user's config directory; a missing or corrupt file just
//! means there is nothing to seed with.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ViewerError;

/// The viewer's remembered endpoint and data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerState {
    /// Port of the last successful connection.
    pub last_port: Option<u16>,
    /// Resolved data source path last announced by the server.
    pub last_path: Option<String>,
    /// When this state was written.
    pub saved_at: DateTime<Utc>,
}

impl ViewerState {
    /// Build a state record stamped with the current time.
    pub fn new(last_port: Option<u16>, last_path: Option<String>) -> Self {
        Self {
            last_port,
            last_path,
            saved_at: Utc::now(),
        }
    }
}

/// Default location of the state file: `<config_dir>/sqlscope/viewer.json`.
///
/// `None` when the platform reports no config directory.
pub fn default_state_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sqlscope").join("viewer.json"))
}

/// Load persisted state from `path`.
///
/// A missing or unparsable file yields `None` -- stale or corrupt state
/// only costs one extra probe, so it is not worth failing over.
pub fn load(path: &Path) -> Option<ViewerState> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no persisted viewer state");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(state) => Some(state),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "persisted viewer state unreadable");
            None
        }
    }
}

/// Write `state` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ViewerError::Persist`] if the directory or file cannot be
/// written, or [`ViewerError::Serialization`] if encoding fails.
pub fn save(path: &Path, state: &ViewerState) -> Result<(), ViewerError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(state)?;
    std::fs::write(path, json)?;
    debug!(path = %path.display(), port = state.last_port, "viewer state saved");
    Ok(())
}
