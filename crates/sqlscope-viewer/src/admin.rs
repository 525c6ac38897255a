//! One-shot calls to the server's admin REST surface.
//!
//! These wrap the same switch operation the session protocol exposes,
//! for administrative use outside the persistent channel (scripts,
//! health checks, a settings form submitting a new path).

use serde::Deserialize;

use sqlscope_types::SwitchAck;

use crate::error::ViewerError;

/// Response body of `GET /api/database`.
#[derive(Debug, Deserialize)]
struct PathResponse {
    path: Option<String>,
}

/// Fetch the server's current resolved data source path.
///
/// `base_url` is the HTTP origin, e.g. `http://127.0.0.1:4000`. Returns
/// `None` when the server is in its degraded no-data-source state.
///
/// # Errors
///
/// Returns [`ViewerError::Admin`] on HTTP failure.
pub async fn current_database(base_url: &str) -> Result<Option<String>, ViewerError> {
    let response = reqwest::get(format!("{base_url}/api/database"))
        .await?
        .error_for_status()?;
    let body: PathResponse = response.json().await?;
    Ok(body.path)
}

/// Ask the server to switch its active data source.
///
/// The ack body is returned for both outcomes -- a failed switch comes
/// back as `{success: false, message}` rather than an HTTP-level error.
///
/// # Errors
///
/// Returns [`ViewerError::Admin`] on HTTP transport failure.
pub async fn change_database(base_url: &str, db_path: &str) -> Result<SwitchAck, ViewerError> {
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{base_url}/api/database"))
        .json(&serde_json::json!({ "dbPath": db_path }))
        .send()
        .await?;
    Ok(response.json().await?)
}
