//! Configuration for the observer server binary.
//!
//! All configuration is loaded from environment variables with sensible
//! defaults, so a bare `sqlscope-server` starts observing a local file
//! immediately.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ServerError;

/// Complete server configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the database file to observe at startup.
    pub db_path: PathBuf,
    /// Host address to bind.
    pub host: String,
    /// Preferred TCP port; the port search probes upward from here.
    pub port: u16,
    /// Bounded number of ports to try before failing startup.
    pub port_attempts: u16,
    /// Watcher poll interval.
    pub poll_interval: Duration,
    /// Row window size for snapshots.
    pub row_limit: u32,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// All variables are optional:
    /// - `SQLSCOPE_DB_PATH` -- database file to observe (default `./database.sqlite`)
    /// - `SQLSCOPE_HOST` -- bind address (default `127.0.0.1`)
    /// - `SQLSCOPE_PORT` -- preferred port (default `4000`)
    /// - `SQLSCOPE_PORT_ATTEMPTS` -- port search width (default `10`)
    /// - `SQLSCOPE_POLL_INTERVAL_MS` -- watcher poll interval (default `1000`)
    /// - `SQLSCOPE_ROW_LIMIT` -- snapshot window size (default `100`)
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] if a set variable fails to parse.
    pub fn from_env() -> Result<Self, ServerError> {
        let db_path = std::env::var("SQLSCOPE_DB_PATH")
            .map_or_else(|_| PathBuf::from("./database.sqlite"), PathBuf::from);

        let host =
            std::env::var("SQLSCOPE_HOST").unwrap_or_else(|_| String::from("127.0.0.1"));

        let port: u16 = env_parse("SQLSCOPE_PORT", 4000)?;
        let port_attempts: u16 = env_parse("SQLSCOPE_PORT_ATTEMPTS", 10)?;
        let poll_interval_ms: u64 = env_parse("SQLSCOPE_POLL_INTERVAL_MS", 1000)?;
        let row_limit: u32 = env_parse("SQLSCOPE_ROW_LIMIT", 100)?;

        Ok(Self {
            db_path,
            host,
            port,
            port_attempts,
            poll_interval: Duration::from_millis(poll_interval_ms),
            row_limit,
        })
    }
}

/// Parse an optional environment variable, falling back to a default.
fn env_parse<T>(name: &str, default: T) -> Result<T, ServerError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| ServerError::Config(format!("invalid {name}: {e}"))),
        Err(_) => Ok(default),
    }
}
