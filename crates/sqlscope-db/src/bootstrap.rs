//! One-time seeding of a brand-new database file.
//!
//! Switching the observer to a path that does not exist yet creates the
//! file and fills it with a small demonstrative schema, so the new source
//! is immediately explorable in a viewer. An existing file is never
//! touched.

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::error::DbError;

/// The demonstrative schema: two sample tables with a few seed rows each.
const SEED_SCHEMA: &str = "
CREATE TABLE users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT UNIQUE NOT NULL,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

INSERT INTO users (name, email) VALUES
    ('John Doe', 'john@example.com'),
    ('Jane Smith', 'jane@example.com'),
    ('Bob Johnson', 'bob@example.com');

CREATE TABLE products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    price REAL NOT NULL,
    stock INTEGER DEFAULT 0,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

INSERT INTO products (name, price, stock) VALUES
    ('Laptop', 999.99, 10),
    ('Smartphone', 699.99, 25),
    ('Headphones', 149.99, 50);
";

/// Create the file at `path` and seed it with the demonstrative schema.
///
/// Does nothing if the file already exists -- seeding must never clobber
/// real data. This is the only write path in the whole observer; it uses
/// a dedicated short-lived read-write connection that is closed before
/// the function returns.
///
/// # Errors
///
/// Returns [`DbError::QueryFailed`] if the file cannot be created or the
/// seed statements fail.
pub async fn create_seeded(path: &Path) -> Result<(), DbError> {
    if path.exists() {
        tracing::debug!(path = %path.display(), "file exists, skipping seed");
        return Ok(());
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    sqlx::raw_sql(SEED_SCHEMA).execute(&pool).await?;
    pool.close().await;

    tracing::info!(path = %path.display(), "created and seeded new database file");
    Ok(())
}
