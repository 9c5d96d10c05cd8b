//! Warehouse interfaces and row types

use crate::config::TableRef;
use crate::error::Result;
use crate::fetch::RawRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One record as persisted: the raw document plus its upload time
#[derive(Debug, Clone)]
pub struct IngestedRow {
    /// Record exactly as the API returned it
    pub raw: RawRecord,
    /// When the row was handed to the sink (UTC)
    pub ingested_at: DateTime<Utc>,
}

impl IngestedRow {
    /// Stamp every record of a page with the same ingestion time
    pub fn stamp(records: &[RawRecord], ingested_at: DateTime<Utc>) -> Vec<Self> {
        records
            .iter()
            .map(|raw| Self {
                raw: raw.clone(),
                ingested_at,
            })
            .collect()
    }
}

/// Outcome of a successful insert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InsertResult {
    /// Rows durably written by the call
    pub rows_written: usize,
}

/// Highest previously loaded record of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckpointRow {
    /// Monotonic id of the record (`sub_id`)
    pub last_index: String,
    /// The record's ordering-field value; may be null upstream
    pub last_ordering_value: Option<String>,
}

/// Append-only destination for ingested rows.
///
/// Implementations must be all-or-nothing per call: either every row of
/// `rows` is durably written or none is. Duplicate rows are acceptable.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Append rows to `table`
    async fn insert(&self, rows: &[IngestedRow], table: &TableRef) -> Result<InsertResult>;
}

/// Read side used to re-derive the resume point from loaded data
#[async_trait]
pub trait CheckpointQuery: Send + Sync {
    /// Row with the maximum `id_field` in `table`, with its `ordering_field`.
    ///
    /// `Ok(None)` when the table is empty or does not exist yet; any other
    /// failure is an [`Error::CheckpointQuery`](crate::Error::CheckpointQuery).
    async fn latest(
        &self,
        table: &TableRef,
        id_field: &str,
        ordering_field: &str,
    ) -> Result<Option<CheckpointRow>>;
}
