//! Engine types
//!
//! Per-run state and the summary reported to the trigger surfaces.

use crate::config::DataType;
use crate::cursor::Cursor;
use serde::Serialize;

/// Result of one completed (or cooperatively cancelled) extraction run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Data type that was extracted
    pub data_type: DataType,
    /// API calls issued by this run
    pub calls_issued: u64,
    /// Rows the sink reported as written
    pub rows_loaded: u64,
    /// Checkpoint the run resumed from, if any
    pub resumed_from: Option<Cursor>,
    /// Last cursor the server handed out during the run
    pub last_cursor: Option<Cursor>,
    /// Whether the run stopped early on a cancellation request
    pub cancelled: bool,
    /// Wall-clock duration
    pub duration_ms: u64,
}

/// Mutable state of a run in progress; lives only inside `Extractor::run`
#[derive(Debug, Clone)]
pub(crate) struct RunState {
    pub data_type: DataType,
    pub calls_issued: u64,
    pub rows_loaded: u64,
    pub resumed_from: Option<Cursor>,
    /// Cursor the next request is made with (checkpoint or server-supplied)
    pub current_cursor: Option<Cursor>,
    /// Last cursor received from the server
    pub last_cursor: Option<Cursor>,
    pub cancelled: bool,
}

impl RunState {
    pub fn new(data_type: DataType, resumed_from: Option<Cursor>) -> Self {
        Self {
            data_type,
            calls_issued: 0,
            rows_loaded: 0,
            current_cursor: resumed_from.clone(),
            resumed_from,
            last_cursor: None,
            cancelled: false,
        }
    }

    pub fn add_call(&mut self) {
        self.calls_issued += 1;
    }

    pub fn add_rows(&mut self, rows: usize) {
        self.rows_loaded += rows as u64;
    }

    /// Move to the server's next cursor
    pub fn advance(&mut self, next: Cursor) {
        self.current_cursor = Some(next.clone());
        self.last_cursor = Some(next);
    }

    pub fn into_summary(self, duration_ms: u64) -> RunSummary {
        RunSummary {
            data_type: self.data_type,
            calls_issued: self.calls_issued,
            rows_loaded: self.rows_loaded,
            last_cursor: self.last_cursor,
            resumed_from: self.resumed_from,
            cancelled: self.cancelled,
            duration_ms,
        }
    }
}
