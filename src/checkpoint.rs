//! Checkpoint resolution
//!
//! The resume point of a run is re-derived from the warehouse every time:
//! the highest-id record already loaded defines the cursor. There is no
//! separate checkpoint file to fall out of sync with the data.

use crate::config::{DataTypeConfig, TableRef};
use crate::cursor::Cursor;
use crate::error::Result;
use crate::warehouse::CheckpointQuery;
use std::sync::Arc;
use tracing::{debug, info};

/// Turns the warehouse's latest row into a resume [`Cursor`]
#[derive(Clone)]
pub struct CheckpointResolver {
    query: Arc<dyn CheckpointQuery>,
}

impl CheckpointResolver {
    /// Create a resolver over a checkpoint query
    pub fn new(query: Arc<dyn CheckpointQuery>) -> Self {
        Self { query }
    }

    /// Resume cursor for `table`, or `None` on a first run.
    ///
    /// The cursor carries the record id under the first cursor field and the
    /// ordering value under the second, named as the API expects them.
    pub async fn resolve(
        &self,
        table: &TableRef,
        data_type: &DataTypeConfig,
    ) -> Result<Option<Cursor>> {
        let latest = self
            .query
            .latest(table, data_type.id_field, data_type.ordering_field)
            .await?;

        let Some(row) = latest else {
            info!(table = %table, "No checkpoint found, starting from the beginning");
            return Ok(None);
        };

        let cursor = Cursor::new()
            .with(data_type.id_cursor_field(), row.last_index)
            .with(data_type.ordering_cursor_field(), row.last_ordering_value);

        debug!(table = %table, cursor = %cursor, "Resolved checkpoint");
        Ok(Some(cursor))
    }
}

impl std::fmt::Debug for CheckpointResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckpointResolver").finish_non_exhaustive()
    }
}
