//! Execution engine module
//!
//! Main pagination loop for one data type.
//!
//! # Overview
//!
//! `Extractor::run` resolves the checkpoint once, then repeatedly fetches
//! a page, hands non-empty pages to the sink and advances to the cursor the
//! server reported, until the server reports no further cursor. Progress is
//! only ever read back from the warehouse, so a failed or interrupted run
//! can simply be started again.

mod types;

pub use types::RunSummary;

use crate::checkpoint::CheckpointResolver;
use crate::config::{DataType, DataTypeConfig, ExtractorConfig};
use crate::cursor::{Cursor, QueryParams};
use crate::error::{Error, Result};
use crate::fetch::PageFetcher;
use crate::warehouse::{IngestedRow, Sink};
use chrono::Utc;
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use types::RunState;

/// Incremental extraction orchestrator
pub struct Extractor {
    config: Arc<ExtractorConfig>,
    fetcher: Arc<dyn PageFetcher>,
    sink: Arc<dyn Sink>,
    checkpoints: CheckpointResolver,
    cancel: CancellationToken,
}

impl Extractor {
    /// Create an extractor from its collaborators
    pub fn new(
        config: Arc<ExtractorConfig>,
        fetcher: Arc<dyn PageFetcher>,
        sink: Arc<dyn Sink>,
        checkpoints: CheckpointResolver,
    ) -> Self {
        Self {
            config,
            fetcher,
            sink,
            checkpoints,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that stops the loop before the next page is requested
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Process configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Credential, committee filter, sort and page size
    pub fn base_params(&self, data_type: &DataTypeConfig) -> QueryParams {
        let mut params = QueryParams::new();
        params.insert("api_key".into(), self.config.api_key.clone());
        params.insert("committee_id".into(), self.config.committee_id.clone());
        params.insert("sort".into(), data_type.ordering_field.to_string());
        params.insert("per_page".into(), self.config.page_size.to_string());
        params
    }

    /// Run by selector name, rejecting unknown names before any I/O
    pub async fn run_named(&self, data_type: &str) -> Result<RunSummary> {
        let data_type: DataType = data_type.parse()?;
        self.run(data_type).await
    }

    /// Extract every data type in order, stopping at the first failure
    pub async fn run_all(&self, data_types: &[DataType]) -> Result<Vec<RunSummary>> {
        let mut summaries = Vec::with_capacity(data_types.len());
        for data_type in data_types {
            let summary = self.run(*data_type).await?;
            let cancelled = summary.cancelled;
            summaries.push(summary);
            if cancelled {
                break;
            }
        }
        Ok(summaries)
    }

    /// Extract all records of `data_type` newer than the warehouse checkpoint
    pub async fn run(&self, data_type: DataType) -> Result<RunSummary> {
        let start = Instant::now();
        let dt = data_type.config();
        let table = self.config.table_for(data_type)?;

        info!(data_type = %data_type, table = %table, "Starting extraction");

        let mut params = self.base_params(dt);
        let resumed_from = self.checkpoints.resolve(&table, dt).await?;
        if let Some(cursor) = &resumed_from {
            info!(data_type = %data_type, cursor = %cursor, "Resuming from checkpoint");
            cursor.apply_to(dt.cursor_fields, &mut params);
        }

        let mut state = RunState::new(data_type, resumed_from);

        loop {
            if self.cancel.is_cancelled() {
                info!(
                    data_type = %data_type,
                    calls = state.calls_issued,
                    rows = state.rows_loaded,
                    "Extraction cancelled between pages"
                );
                state.cancelled = true;
                break;
            }

            let page = self.fetcher.fetch(dt.endpoint, &params).await?;
            state.add_call();

            if state.calls_issued == 1 {
                info!(
                    data_type = %data_type,
                    total_count = ?page.pagination.total_count,
                    total_pages = ?page.pagination.total_pages,
                    "Records to extract"
                );
            }

            if !page.is_empty() {
                let rows = IngestedRow::stamp(&page.results, Utc::now());
                let result = self.sink.insert(&rows, &table).await?;
                if result.rows_written != rows.len() {
                    return Err(Error::sink(
                        table.to_string(),
                        format!(
                            "sink wrote {} of {} rows",
                            result.rows_written,
                            rows.len()
                        ),
                    ));
                }
                state.add_rows(result.rows_written);
            }

            debug!(
                data_type = %data_type,
                page = state.calls_issued,
                records = page.len(),
                rows_loaded = state.rows_loaded,
                "Processed page"
            );

            let Some(next) = page.next_cursor() else {
                break;
            };
            self.check_cursor_order(state.current_cursor.as_ref(), next, dt)?;
            next.apply_to(dt.cursor_fields, &mut params);
            state.advance(next.clone());
        }

        #[allow(clippy::cast_possible_truncation)]
        let summary = state.into_summary(start.elapsed().as_millis() as u64);

        info!(
            data_type = %data_type,
            calls = summary.calls_issued,
            rows = summary.rows_loaded,
            cancelled = summary.cancelled,
            "Extraction finished"
        );
        Ok(summary)
    }

    /// Verify the id component of the cursor moved forward
    fn check_cursor_order(
        &self,
        previous: Option<&Cursor>,
        next: &Cursor,
        dt: &DataTypeConfig,
    ) -> Result<()> {
        let Some(previous) = previous else {
            return Ok(());
        };
        let id_field = dt.id_cursor_field();
        if next.compare_id(previous, id_field) != Some(Ordering::Less) {
            return Ok(());
        }

        let previous_id = previous.param_value(id_field).unwrap_or_default();
        let next_id = next.param_value(id_field).unwrap_or_default();
        if self.config.strict_cursor_order {
            return Err(Error::CursorRegression {
                previous: previous_id,
                next: next_id,
            });
        }
        warn!(
            previous = %previous_id,
            next = %next_id,
            "Server cursor moved backwards; following it anyway"
        );
        Ok(())
    }
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("config", &self.config)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}
