//! End-to-end tests: a real observer server, a real viewer client.
//!
//! Each test boots the full server stack on an OS-assigned port and
//! drives it through the viewer crate's discovery, session, and admin
//! code paths -- the same wiring as two separate processes, minus the
//! process boundary.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::indexing_slicing
)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use sqlscope_server::{build_router, serve, AppState, Registry, RegistryConfig};
use sqlscope_types::{ClientMessage, ServerMessage};
use sqlscope_viewer::{
    admin, connect as discover, persist, Session, SessionState, ViewerClient, ViewerConfig,
    ViewerError,
};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(10);

/// Ports that nothing on the loopback interface listens on; connection
/// attempts are refused immediately.
const DEAD_PORTS: [u16; 2] = [1, 2];

/// Boot a full observer server on an OS-assigned port, observing a
/// freshly seeded database file under `dir`.
async fn start_server(dir: &Path) -> u16 {
    let registry = Arc::new(Registry::new(RegistryConfig {
        poll_interval: Duration::from_secs(600),
        row_limit: 100,
    }));
    registry.switch(&dir.join("e2e.sqlite")).await.unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let state = Arc::new(AppState::new(registry, port));
    let router = build_router(state);
    tokio::spawn(async move {
        let _ = serve(listener, router).await;
    });
    port
}

/// Create a database file with a single `inventory` table.
async fn seed_inventory(path: &Path) {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let mut conn = options.connect().await.unwrap();
    sqlx::raw_sql("CREATE TABLE inventory (id INTEGER PRIMARY KEY, qty INTEGER);")
        .execute(&mut conn)
        .await
        .unwrap();
    conn.close().await.unwrap();
}

/// Drain client events until a table list arrives.
async fn await_tables(client: &mut ViewerClient) -> Vec<String> {
    loop {
        match timeout(WAIT, client.next_event()).await.unwrap() {
            Some(ServerMessage::Tables(tables)) => return tables,
            Some(_) => {}
            None => panic!("client stopped while awaiting tables"),
        }
    }
}

#[tokio::test]
async fn discovery_skips_dead_candidates_and_persists_the_winner() {
    let dir = tempfile::tempdir().unwrap();
    let port = start_server(dir.path()).await;
    let state_path = dir.path().join("viewer.json");

    let config = ViewerConfig {
        host: String::from("127.0.0.1"),
        candidate_ports: vec![DEAD_PORTS[0], DEAD_PORTS[1], port],
        state_path: Some(state_path.clone()),
    };

    let mut client = ViewerClient::connect(config).await.unwrap();
    assert_eq!(client.status(), SessionState::Ready);

    // The confirmed port is the seed for the next discovery pass.
    let saved = persist::load(&state_path).unwrap();
    assert_eq!(saved.last_port, Some(port));
    assert!(saved.last_path.unwrap().ends_with("e2e.sqlite"));

    client.request(ClientMessage::GetTables).await.unwrap();
    let mut tables = await_tables(&mut client).await;
    tables.sort();
    assert_eq!(tables, ["products", "users"]);

    client.shutdown();
}

#[tokio::test]
async fn exhausted_candidates_surface_no_server_reachable() {
    let dir = tempfile::tempdir().unwrap();
    let config = ViewerConfig {
        host: String::from("127.0.0.1"),
        candidate_ports: vec![DEAD_PORTS[0], DEAD_PORTS[1]],
        state_path: Some(dir.path().join("viewer.json")),
    };

    let err = ViewerClient::connect(config).await.unwrap_err();
    assert!(matches!(err, ViewerError::NoServerReachable));
}

#[tokio::test]
async fn handshake_announces_bound_port_and_active_path() {
    let dir = tempfile::tempdir().unwrap();
    let port = start_server(dir.path()).await;

    let (ws, probed) = discover("127.0.0.1", &[port], None).await.unwrap();
    assert_eq!(probed, port);

    let mut session = Session::new(ws);
    assert_eq!(session.state(), SessionState::Handshaking);

    session.complete_handshake().await.unwrap();
    assert_eq!(session.state(), SessionState::Ready);
    assert_eq!(session.server_port(), Some(port));
    assert!(session.database_path().unwrap().ends_with("e2e.sqlite"));

    let mut tables = session.request_tables().await.unwrap();
    tables.sort();
    assert_eq!(tables, ["products", "users"]);

    let users = session.request_table_data("users").await.unwrap();
    assert_eq!(users.rows.len(), 3);
    assert_eq!(users.columns, ["id", "name", "email", "created_at"]);
}

#[tokio::test]
async fn admin_switch_notifies_sessions_and_changes_the_table_set() {
    let dir = tempfile::tempdir().unwrap();
    let port = start_server(dir.path()).await;
    let base_url = format!("http://127.0.0.1:{port}");
    let state_path = dir.path().join("viewer.json");

    let config = ViewerConfig {
        host: String::from("127.0.0.1"),
        candidate_ports: vec![port],
        state_path: Some(state_path.clone()),
    };
    let mut client = ViewerClient::connect(config).await.unwrap();

    // Admin surface reads the current path.
    let current = admin::current_database(&base_url).await.unwrap();
    assert!(current.unwrap().ends_with("e2e.sqlite"));

    // Switch to a pre-seeded file with a different schema.
    let inventory_db = dir.path().join("inventory.sqlite");
    seed_inventory(&inventory_db).await;
    let ack = admin::change_database(&base_url, &inventory_db.display().to_string())
        .await
        .unwrap();
    assert!(ack.success);
    assert!(ack.path.unwrap().ends_with("inventory.sqlite"));

    // The connected session hears both broadcast signals.
    let mut new_path = None;
    let mut content_changed = false;
    while new_path.is_none() || !content_changed {
        match timeout(WAIT, client.next_event()).await.unwrap() {
            Some(ServerMessage::DatabasePathChanged(path)) => new_path = Some(path),
            Some(ServerMessage::DatabaseChanged) => content_changed = true,
            Some(_) => {}
            None => panic!("client stopped while awaiting switch broadcasts"),
        }
    }
    assert!(new_path.unwrap().ends_with("inventory.sqlite"));

    // A fresh table-list request reflects the new source.
    client.request(ClientMessage::GetTables).await.unwrap();
    assert_eq!(await_tables(&mut client).await, ["inventory"]);

    // The persisted seed now carries the new path.
    let saved = persist::load(&state_path).unwrap();
    assert!(saved.last_path.unwrap().ends_with("inventory.sqlite"));

    // A failed switch reports through the ack and leaves the registry
    // on the inventory source.
    let bad = dir.path().join("absent").join("x.sqlite");
    let ack = admin::change_database(&base_url, &bad.display().to_string())
        .await
        .unwrap();
    assert!(!ack.success);
    assert!(ack.message.unwrap().contains("directory not found"));

    let current = admin::current_database(&base_url).await.unwrap();
    assert!(current.unwrap().ends_with("inventory.sqlite"));

    client.shutdown();
}
