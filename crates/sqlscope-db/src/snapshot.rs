//! The snapshot engine: table name in, recency-ordered row window out.
//!
//! Ordering is zero-configuration by design: if the table carries a
//! recognizable date-like column the rows are ordered by it descending,
//! otherwise by the storage engine's own insertion sequence (`rowid`)
//! descending. Either way the first row is the most recent one and the
//! result is already in display order -- it is never reversed.

use std::collections::BTreeMap;

use base64::prelude::{Engine as _, BASE64_STANDARD};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, SqlitePool, TypeInfo, ValueRef};

use sqlscope_types::TableData;

use crate::error::DbError;

/// Default row window size for a snapshot.
pub const DEFAULT_ROW_LIMIT: u32 = 100;

/// Date-like column names that select the ordering column, scanned in
/// this priority order. The first candidate with a (case-insensitive)
/// match among the table's columns wins.
const ORDER_CANDIDATES: [&str; 4] = ["created_at", "timestamp", "date", "datetime"];

/// List every user table in the database.
///
/// Internal catalog tables (`sqlite_*`) are excluded. The order is
/// whatever the catalog returns, which is stable within one connection.
///
/// # Errors
///
/// Returns [`DbError::QueryFailed`] if the catalog read fails.
pub async fn list_tables(pool: &SqlitePool) -> Result<Vec<String>, DbError> {
    let names = sqlx::query_scalar::<_, String>(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
    )
    .fetch_all(pool)
    .await?;

    Ok(names)
}

/// Produce a snapshot of `table`: its column schema and a row window of at
/// most `limit` rows, newest first.
///
/// The schema is introspected fresh on every call -- it may have changed
/// since the last request, so nothing here is cached.
///
/// # Errors
///
/// - [`DbError::InvalidIdentifier`] if `table` contains any character
///   outside `[A-Za-z0-9_]` (checked before any schema lookup)
/// - [`DbError::TableNotFound`] if introspection yields zero columns
/// - [`DbError::QueryFailed`] for any underlying read failure
pub async fn snapshot(pool: &SqlitePool, table: &str, limit: u32) -> Result<TableData, DbError> {
    validate_identifier(table)?;

    let columns = table_columns(pool, table).await?;
    if columns.is_empty() {
        return Err(DbError::TableNotFound(table.to_owned()));
    }

    // The table name is validated above and the ordering column comes from
    // the schema itself, so interpolating both is safe. The limit is bound.
    let sql = match order_column(&columns) {
        Some(col) => {
            format!("SELECT * FROM \"{table}\" ORDER BY \"{col}\" DESC LIMIT ?1")
        }
        None => format!("SELECT * FROM \"{table}\" ORDER BY rowid DESC LIMIT ?1"),
    };

    let rows = sqlx::query(&sql)
        .bind(i64::from(limit))
        .fetch_all(pool)
        .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in &rows {
        records.push(row_to_record(row)?);
    }

    tracing::debug!(table, rows = records.len(), "snapshot taken");

    Ok(TableData {
        name: table.to_owned(),
        columns,
        rows: records,
    })
}

/// Reject any identifier not matching `^[A-Za-z0-9_]+$`.
fn validate_identifier(name: &str) -> Result<(), DbError> {
    let valid =
        !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(DbError::InvalidIdentifier(name.to_owned()))
    }
}

/// Column names for `table` in schema declaration order.
async fn table_columns(pool: &SqlitePool, table: &str) -> Result<Vec<String>, DbError> {
    let columns = sqlx::query_scalar::<_, String>(
        "SELECT name FROM pragma_table_info(?1) ORDER BY cid",
    )
    .bind(table)
    .fetch_all(pool)
    .await?;

    Ok(columns)
}

/// Select the ordering column, if any, per the candidate priority list.
fn order_column(columns: &[String]) -> Option<&str> {
    ORDER_CANDIDATES.iter().find_map(|candidate| {
        columns
            .iter()
            .find(|col| col.eq_ignore_ascii_case(candidate))
            .map(String::as_str)
    })
}

/// Convert one result row into a column-name -> JSON value record.
fn row_to_record(row: &SqliteRow) -> Result<BTreeMap<String, Value>, DbError> {
    let mut record = BTreeMap::new();
    for column in row.columns() {
        let value = decode_value(row, column.ordinal())?;
        record.insert(column.name().to_owned(), value);
    }
    Ok(record)
}

/// Decode a single cell by its reported SQLite type.
///
/// The reported type is the column's declared affinity when one exists
/// (`DATETIME` for a `TIMESTAMP` column), otherwise the value's storage
/// class. Date-like columns decode as text -- that is how SQLite stores
/// them by convention, and integer-epoch values coerce to their digit
/// string rather than silently truncating. BLOBs are base64-encoded
/// since raw bytes have no JSON representation.
fn decode_value(row: &SqliteRow, idx: usize) -> Result<Value, DbError> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    let info = raw.type_info();
    match info.name() {
        "INTEGER" => Ok(Value::from(row.try_get::<i64, _>(idx)?)),
        "REAL" => {
            let v: f64 = row.try_get(idx)?;
            Ok(serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number))
        }
        "TEXT" | "DATETIME" | "DATE" | "TIME" => {
            Ok(Value::String(row.try_get::<String, _>(idx)?))
        }
        "BOOLEAN" => Ok(Value::Bool(row.try_get::<bool, _>(idx)?)),
        "BLOB" => {
            let bytes: Vec<u8> = row.try_get(idx)?;
            Ok(Value::String(BASE64_STANDARD.encode(bytes)))
        }
        _ => Ok(decode_lenient(row, idx)),
    }
}

/// Decoder chain for values with an unrecognized declared type
/// (`NUMERIC` and friends). Floats are tried before integers because
/// SQLite's integer coercion truncates fractional values, while integers
/// survive a float round-trip exactly.
fn decode_lenient(row: &SqliteRow, idx: usize) -> Value {
    if let Ok(v) = row.try_get::<f64, _>(idx) {
        return serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number);
    }
    if let Ok(v) = row.try_get::<String, _>(idx) {
        return Value::String(v);
    }
    if let Ok(v) = row.try_get::<Vec<u8>, _>(idx) {
        return Value::String(BASE64_STANDARD.encode(v));
    }
    Value::Null
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_validation() {
        assert!(validate_identifier("orders").is_ok());
        assert!(validate_identifier("Orders_2026").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("users; DROP TABLE users").is_err());
        assert!(validate_identifier("a-b").is_err());
        assert!(validate_identifier("naïve").is_err());
    }

    #[test]
    fn order_column_priority_beats_column_order() {
        // `datetime` appears first in the schema, but `created_at` has
        // higher candidate priority and must win.
        let columns = vec![
            String::from("datetime"),
            String::from("id"),
            String::from("Created_At"),
        ];
        assert_eq!(order_column(&columns), Some("Created_At"));
    }

    #[test]
    fn order_column_is_case_insensitive() {
        let columns = vec![String::from("id"), String::from("TIMESTAMP")];
        assert_eq!(order_column(&columns), Some("TIMESTAMP"));
    }

    #[test]
    fn order_column_absent_means_rowid() {
        let columns = vec![String::from("id"), String::from("body")];
        assert_eq!(order_column(&columns), None);
    }
}
