//! DuckDB-backed warehouse
//!
//! Each data type lands in `<dataset>.<table>` with two columns:
//! `results` (the record JSON, byte for byte as the API sent it) and
//! `created_at` (ingestion time). The checkpoint is read back out of
//! `results` with DuckDB's JSON functions.
//!
//! DuckDB calls block, so every statement runs on the blocking pool.

use super::types::{CheckpointQuery, CheckpointRow, IngestedRow, InsertResult, Sink};
use crate::config::{validate_identifier, TableRef};
use crate::error::{Error, Result};
use async_trait::async_trait;
use duckdb::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// Warehouse over a single DuckDB connection
pub struct DuckDbWarehouse {
    conn: Arc<Mutex<Connection>>,
    location: String,
}

impl DuckDbWarehouse {
    /// Open (or create) a database file
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| Error::config(format!("Failed to open DuckDB warehouse: {e}")))?;
        Ok(Self::from_connection(conn, path.display().to_string()))
    }

    /// In-memory warehouse, gone when dropped
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::config(format!("Failed to open DuckDB warehouse: {e}")))?;
        Ok(Self::from_connection(conn, ":memory:".to_string()))
    }

    fn from_connection(conn: Connection, location: String) -> Self {
        info!(path = %location, "Opened warehouse");
        Self {
            conn: Arc::new(Mutex::new(conn)),
            location,
        }
    }

    /// Run `f` against the connection on the blocking pool
    async fn blocking<T, F>(&self, table: &TableRef, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let name = table.to_string();
        tokio::task::spawn_blocking(move || {
            let mut guard = lock(&conn, &name)?;
            f(&mut *guard)
        })
        .await
        .map_err(|e| Error::sink(table.to_string(), format!("warehouse task failed: {e}")))?
    }

    /// Number of rows currently in `table` (0 if it does not exist)
    #[cfg(test)]
    pub(crate) fn count_rows(&self, table: &TableRef) -> Result<u64> {
        let conn = lock(&self.conn, &table.to_string())?;
        let to_err = |e: duckdb::Error| Error::checkpoint(table.to_string(), e);
        if !table_exists(&conn, table).map_err(to_err)? {
            return Ok(0);
        }
        let count: i64 = conn
            .query_row(&format!("SELECT count(*) FROM {}", table.sql_name()), [], |row| {
                row.get(0)
            })
            .map_err(to_err)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Stored `results` strings of `table` in insertion order
    #[cfg(test)]
    pub(crate) fn raw_records(&self, table: &TableRef) -> Result<Vec<String>> {
        let conn = lock(&self.conn, &table.to_string())?;
        let to_err = |e: duckdb::Error| Error::checkpoint(table.to_string(), e);
        if !table_exists(&conn, table).map_err(to_err)? {
            return Ok(Vec::new());
        }
        let mut stmt = conn
            .prepare(&format!("SELECT results FROM {} ORDER BY rowid", table.sql_name()))
            .map_err(to_err)?;
        let raw = stmt
            .query_map([], |row| row.get(0))
            .map_err(to_err)?
            .collect::<std::result::Result<Vec<String>, _>>()
            .map_err(to_err)?;
        Ok(raw)
    }
}

impl std::fmt::Debug for DuckDbWarehouse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbWarehouse")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Sink for DuckDbWarehouse {
    async fn insert(&self, rows: &[IngestedRow], table: &TableRef) -> Result<InsertResult> {
        if rows.is_empty() {
            return Ok(InsertResult { rows_written: 0 });
        }

        let values: Vec<(String, String)> = rows
            .iter()
            .map(|row| (row.raw.get().to_string(), row.ingested_at.to_rfc3339()))
            .collect();
        let target = table.clone();

        let written = self
            .blocking(table, move |conn| {
                let to_err = |e: duckdb::Error| Error::sink(target.to_string(), e);

                let tx = conn.transaction().map_err(to_err)?;
                create_table(&tx, &target).map_err(to_err)?;

                let mut written = 0;
                {
                    let mut stmt = tx
                        .prepare(&format!(
                            "INSERT INTO {} (results, created_at) VALUES (?, CAST(? AS TIMESTAMPTZ))",
                            target.sql_name()
                        ))
                        .map_err(to_err)?;
                    for (raw, created_at) in &values {
                        written += stmt.execute(params![raw, created_at]).map_err(to_err)?;
                    }
                }
                tx.commit().map_err(to_err)?;
                Ok(written)
            })
            .await?;

        debug!(table = %table, rows = written, "Loaded rows");
        Ok(InsertResult {
            rows_written: written,
        })
    }
}

#[async_trait]
impl CheckpointQuery for DuckDbWarehouse {
    async fn latest(
        &self,
        table: &TableRef,
        id_field: &str,
        ordering_field: &str,
    ) -> Result<Option<CheckpointRow>> {
        validate_identifier("id_field", id_field)?;
        validate_identifier("ordering_field", ordering_field)?;

        // Numeric order on the id; the string form breaks ties between
        // values that do not cast.
        let sql = format!(
            "SELECT json_extract_string(results, '$.{id_field}') AS last_index, \
                    json_extract_string(results, '$.{ordering_field}') AS last_value \
             FROM {table} \
             WHERE json_extract_string(results, '$.{id_field}') IS NOT NULL \
             ORDER BY TRY_CAST(json_extract_string(results, '$.{id_field}') AS HUGEINT) DESC NULLS LAST, \
                      json_extract_string(results, '$.{id_field}') DESC \
             LIMIT 1",
            table = table.sql_name()
        );
        let target = table.clone();

        self.blocking(table, move |conn| {
            let to_err = |e: duckdb::Error| Error::checkpoint(target.to_string(), e);

            if !table_exists(conn, &target).map_err(to_err)? {
                debug!(table = %target, "Table does not exist yet");
                return Ok(None);
            }

            let mut stmt = conn.prepare(&sql).map_err(to_err)?;
            let mut rows = stmt.query([]).map_err(to_err)?;
            let latest = match rows.next().map_err(to_err)? {
                Some(row) => Some(CheckpointRow {
                    last_index: row.get(0).map_err(to_err)?,
                    last_ordering_value: row.get(1).map_err(to_err)?,
                }),
                None => None,
            };
            Ok(latest)
        })
        .await
    }
}

fn lock<'a>(conn: &'a Mutex<Connection>, table: &str) -> Result<MutexGuard<'a, Connection>> {
    conn.lock()
        .map_err(|_| Error::sink(table, "warehouse connection lock poisoned"))
}

fn create_table(conn: &Connection, table: &TableRef) -> duckdb::Result<()> {
    conn.execute_batch(&format!(
        "CREATE SCHEMA IF NOT EXISTS \"{}\"; \
         CREATE TABLE IF NOT EXISTS {} (results VARCHAR NOT NULL, created_at TIMESTAMPTZ NOT NULL);",
        table.dataset,
        table.sql_name()
    ))
}

fn table_exists(conn: &Connection, table: &TableRef) -> duckdb::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT count(*) FROM information_schema.tables WHERE table_schema = ? AND table_name = ?",
        params![table.dataset, table.table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}
