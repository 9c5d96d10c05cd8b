//! Page types
//!
//! Decoded shape of one FEC schedule response:
//!
//! ```json
//! {
//!   "results": [ { ... }, { ... } ],
//!   "pagination": {
//!     "count": 1234, "pages": 13, "per_page": 100,
//!     "last_indexes": { "last_index": "...", "last_contribution_receipt_date": "..." }
//!   }
//! }
//! ```

use crate::cursor::Cursor;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// One record exactly as the API sent it, bytes untouched
pub type RawRecord = Box<RawValue>;

/// One API response page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    /// Raw records, passed through untouched
    #[serde(default)]
    pub results: Vec<RawRecord>,
    /// Pagination metadata
    #[serde(default)]
    pub pagination: Pagination,
}

/// Pagination metadata of a page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    /// Total records matching the query
    #[serde(rename = "count", default)]
    pub total_count: Option<u64>,
    /// Total pages at the requested page size
    #[serde(rename = "pages", default)]
    pub total_pages: Option<u64>,
    /// Page size the server applied
    #[serde(default)]
    pub per_page: Option<u32>,
    /// Cursor of the next page; null once the result set is exhausted
    #[serde(rename = "last_indexes", default)]
    pub next_cursor: Option<Cursor>,
}

impl Page {
    /// Cursor to request the following page with, if any.
    ///
    /// An empty `last_indexes` object carries nothing to resume from and is
    /// treated the same as null.
    pub fn next_cursor(&self) -> Option<&Cursor> {
        self.pagination
            .next_cursor
            .as_ref()
            .filter(|cursor| !cursor.is_empty())
    }

    /// Whether the page carries no records
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Number of records on the page
    pub fn len(&self) -> usize {
        self.results.len()
    }
}
