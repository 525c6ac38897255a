//! Integration tests for the connection registry.
//!
//! Each test runs a real registry against scratch database files in a
//! temp directory, including the watcher wiring, so the close-before-open
//! and broadcast invariants are exercised exactly as in production.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::indexing_slicing
)]

use std::path::Path;
use std::time::{Duration, SystemTime};

use sqlscope_server::{Registry, RegistryConfig, RegistryError};
use sqlscope_types::ServerMessage;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

/// A poll interval long enough that the watcher stays silent during a
/// test unless the test explicitly touches the file.
fn quiet_registry() -> Registry {
    Registry::new(RegistryConfig {
        poll_interval: Duration::from_secs(600),
        row_limit: 100,
    })
}

fn set_mtime(path: &Path, offset_secs: u64) {
    let file = std::fs::OpenOptions::new().write(true).open(path).unwrap();
    let when = SystemTime::now() + Duration::from_secs(offset_secs);
    file.set_modified(when).unwrap();
}

#[tokio::test]
async fn fresh_registry_has_no_active_source() {
    let registry = quiet_registry();

    assert!(registry.current_path().await.is_none());
    assert!(matches!(
        registry.list_tables().await.unwrap_err(),
        RegistryError::NoActiveDataSource
    ));
    assert!(matches!(
        registry.snapshot("users").await.unwrap_err(),
        RegistryError::NoActiveDataSource
    ));
}

#[tokio::test]
async fn switch_seeds_missing_file_and_broadcasts_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("fresh.sqlite");
    let registry = quiet_registry();
    let mut events = registry.subscribe();

    let resolved = registry.switch(&target).await.unwrap();
    assert!(resolved.is_absolute());
    assert!(target.exists());

    // Exactly one path-changed followed by one content-changed signal.
    let expected_path = resolved.display().to_string();
    assert_eq!(
        timeout(WAIT, events.recv()).await.unwrap().unwrap(),
        ServerMessage::DatabasePathChanged(expected_path)
    );
    assert_eq!(
        timeout(WAIT, events.recv()).await.unwrap().unwrap(),
        ServerMessage::DatabaseChanged
    );
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

    // The new source is immediately explorable with the seed schema.
    let mut tables = registry.list_tables().await.unwrap();
    tables.sort();
    assert_eq!(tables, ["products", "users"]);
}

#[tokio::test]
async fn switch_respects_existing_files() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("data.sqlite");
    let registry = quiet_registry();

    registry.switch(&target).await.unwrap();

    // Switching away and back must not reseed the existing file.
    let other = dir.path().join("other.sqlite");
    registry.switch(&other).await.unwrap();
    registry.switch(&target).await.unwrap();

    let users = registry.snapshot("users").await.unwrap();
    assert_eq!(users.rows.len(), 3);
}

#[tokio::test]
async fn missing_parent_fails_and_leaves_previous_source_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.sqlite");
    let registry = quiet_registry();
    let first_resolved = registry.switch(&first).await.unwrap();

    let mut events = registry.subscribe();
    let bad = dir.path().join("no-such-dir").join("x.sqlite");
    let err = registry.switch(&bad).await.unwrap_err();
    assert!(matches!(err, RegistryError::DirectoryNotFound(_)));

    // Previous source still active, nothing was broadcast.
    assert_eq!(registry.current_path().await, Some(first_resolved));
    assert!(registry.list_tables().await.is_ok());
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn snapshot_window_follows_registry_config() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("windowed.sqlite");
    let registry = Registry::new(RegistryConfig {
        poll_interval: Duration::from_secs(600),
        row_limit: 2,
    });
    registry.switch(&target).await.unwrap();

    // The seed schema has 3 users; the configured window caps at 2.
    let users = registry.snapshot("users").await.unwrap();
    assert_eq!(users.rows.len(), 2);
}

#[tokio::test]
async fn invalid_identifier_surfaces_through_the_registry() {
    let dir = tempfile::tempdir().unwrap();
    let registry = quiet_registry();
    registry.switch(&dir.path().join("ids.sqlite")).await.unwrap();

    let err = registry.snapshot("users; DROP TABLE users").await.unwrap_err();
    assert!(err.to_string().contains("invalid table identifier"));
}

#[tokio::test]
async fn file_modification_broadcasts_database_changed() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("watched.sqlite");
    let registry = Registry::new(RegistryConfig {
        poll_interval: Duration::from_millis(20),
        row_limit: 100,
    });
    registry.switch(&target).await.unwrap();

    // Subscribe after the switch so only watcher-driven events arrive.
    let mut events = registry.subscribe();
    set_mtime(&target, 10);

    assert_eq!(
        timeout(WAIT, events.recv()).await.unwrap().unwrap(),
        ServerMessage::DatabaseChanged
    );
}
