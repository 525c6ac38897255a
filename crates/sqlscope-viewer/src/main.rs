//! Headless viewer binary for sqlscope.
//!
//! Connects to a local observer server, follows the active table, and
//! logs every refresh -- a minimal stand-in for a graphical frontend
//! and a handy way to watch a database change from a terminal.

use std::error::Error;

use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use sqlscope_types::{ClientMessage, ServerMessage};
use sqlscope_viewer::{ViewerClient, ViewerConfig};

/// Application entry point for the headless viewer.
///
/// # Errors
///
/// Returns an error when no server is reachable on the first discovery
/// pass or the environment configuration fails to parse.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let mut config = ViewerConfig::default();
    if let Ok(host) = std::env::var("SQLSCOPE_HOST") {
        config.host = host;
    }
    if let Ok(ports) = std::env::var("SQLSCOPE_CANDIDATE_PORTS") {
        config.candidate_ports = ports
            .split(',')
            .map(|p| p.trim().parse())
            .collect::<Result<Vec<u16>, _>>()
            .map_err(|e| format!("invalid SQLSCOPE_CANDIDATE_PORTS: {e}"))?;
    }

    info!(host = config.host.as_str(), "looking for a server");
    let mut client = ViewerClient::connect(config).await?;
    client.request(ClientMessage::GetTables).await?;

    // Follow the first table, like a viewer with nothing selected yet.
    let mut selected: Option<String> = None;

    while let Some(event) = client.next_event().await {
        match event {
            ServerMessage::Tables(tables) => {
                info!(count = tables.len(), "tables");
                if selected.is_none() {
                    if let Some(first) = tables.first() {
                        selected = Some(first.clone());
                        client
                            .request(ClientMessage::GetTableData(first.clone()))
                            .await?;
                    }
                }
            }
            ServerMessage::TableData(data) => {
                info!(table = data.name, rows = data.rows.len(), "snapshot refreshed");
            }
            ServerMessage::DatabaseChanged => {
                if let Some(table) = &selected {
                    client
                        .request(ClientMessage::GetTableData(table.clone()))
                        .await?;
                }
            }
            ServerMessage::DatabasePathChanged(path) => {
                info!(path, "data source switched, refreshing tables");
                selected = None;
                client.request(ClientMessage::GetTables).await?;
            }
            ServerMessage::Error(message) => {
                warn!(message, "server reported an error");
            }
            other => debug!(?other, "event"),
        }
    }

    Ok(())
}
