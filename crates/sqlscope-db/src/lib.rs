//! Data layer for the sqlscope observer.
//!
//! SQLite is the observed store: some other process owns the file and
//! writes to it; this crate only ever reads. It provides:
//!
//! - [`DataSource`] -- a read-only connection pool to one database file
//! - [`list_tables`] / [`snapshot`] -- the snapshot engine turning a table
//!   name into a deterministic, recency-ordered row window
//! - [`bootstrap`] -- one-time creation of a demonstrative seed schema so
//!   a brand-new path is immediately explorable
//!
//! Uses [`sqlx`] with runtime query construction (not compile-time
//! checked) to avoid requiring a live database at build time. Table and
//! column identifiers are validated before they are interpolated into a
//! query; everything else is parameterized.

pub mod bootstrap;
pub mod error;
pub mod snapshot;
pub mod source;

pub use bootstrap::create_seeded;
pub use error::DbError;
pub use snapshot::{list_tables, snapshot, DEFAULT_ROW_LIMIT};
pub use source::DataSource;
