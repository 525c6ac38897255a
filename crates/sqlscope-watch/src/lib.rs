//! Modification-time polling watcher for the observed database file.
//!
//! The database file is mutated by processes outside our control, so the
//! only portable signal available is the file's last-modified timestamp.
//! [`Watcher`] polls it on a fixed interval and emits one [`ChangeEvent`]
//! per observed timestamp transition. It detects *that* the file changed,
//! never *what* changed.
//!
//! # Approximation
//!
//! Two writes that restore the original timestamp within a single poll
//! window are indistinguishable from no change at all. This is an accepted
//! property of timestamp polling, not something the watcher compensates
//! for.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

/// Zero-payload signal meaning "the watched file was modified since the
/// last observation".
///
/// At least one event is emitted per distinct detected modification; no
/// events are emitted while nothing changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent;

/// A background task polling one file's modification timestamp.
///
/// Created with [`Watcher::start`], halted with [`Watcher::stop`]. The
/// watcher holds no handle to the file itself; a missing or unreadable
/// file is tolerated and simply retried on the next tick.
#[derive(Debug)]
pub struct Watcher {
    handle: JoinHandle<()>,
}

impl Watcher {
    /// Begin polling `path` every `interval`, sending one [`ChangeEvent`]
    /// on `tx` per observed modification-timestamp transition.
    ///
    /// The initial timestamp is captured here, before this returns, and
    /// without emitting an event -- any modification from this point on
    /// is a transition. If the file is unreadable now, the first
    /// successful read counts as one (the file appearing is a
    /// modification).
    pub fn start(path: PathBuf, interval: Duration, tx: mpsc::Sender<ChangeEvent>) -> Self {
        let initial = match std::fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(mtime) => Some(mtime),
            Err(e) => {
                debug!(
                    path = %path.display(),
                    error = %e,
                    "initial modification time unavailable, retrying on next tick"
                );
                None
            }
        };
        let handle = tokio::spawn(poll_loop(path, interval, initial, tx));
        Self { handle }
    }

    /// Halt polling. No further events are emitted after this returns.
    pub fn stop(self) {
        self.handle.abort();
    }
}

/// The polling loop: one timestamp read per tick, one event per delta.
async fn poll_loop(
    path: PathBuf,
    interval: Duration,
    mut last: Option<SystemTime>,
    tx: mpsc::Sender<ChangeEvent>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick of a tokio interval completes immediately; consume it
    // so the first comparison happens one full interval after start.
    ticker.tick().await;

    loop {
        ticker.tick().await;

        // A transient read error is swallowed: no event for this tick, the
        // recorded timestamp stays as-is, and the next tick retries.
        let Some(current) = read_mtime(&path).await else {
            continue;
        };

        if last.as_ref() != Some(&current) {
            last = Some(current);
            trace!(path = %path.display(), "modification timestamp transition");
            if tx.send(ChangeEvent).await.is_err() {
                debug!(path = %path.display(), "change receiver dropped, stopping watcher");
                return;
            }
        }
    }
}

/// Read the file's last-modified timestamp, or `None` if the file is
/// missing or unreadable right now.
async fn read_mtime(path: &Path) -> Option<SystemTime> {
    match tokio::fs::metadata(path).await.and_then(|m| m.modified()) {
        Ok(mtime) => Some(mtime),
        Err(e) => {
            trace!(path = %path.display(), error = %e, "modification time read failed");
            None
        }
    }
}
