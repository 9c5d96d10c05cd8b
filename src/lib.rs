// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # fec-extract
//!
//! Incremental, resumable extraction of FEC schedule filings
//! (receipts and disbursements) for one committee into a DuckDB warehouse.
//!
//! ## Features
//!
//! - **Keyset pagination**: follows the API's `last_indexes` cursor page by page
//! - **Resumable**: the resume point is re-derived from the warehouse on every run
//! - **Call budget**: a hard per-process ceiling on API calls
//! - **Append-only loads**: raw records plus an ingestion timestamp, one transaction per page
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fec_extract::checkpoint::CheckpointResolver;
//! use fec_extract::config::{DataType, ExtractorConfig};
//! use fec_extract::engine::Extractor;
//! use fec_extract::fetch::HttpPageFetcher;
//! use fec_extract::http::CallBudget;
//! use fec_extract::warehouse::DuckDbWarehouse;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> fec_extract::Result<()> {
//!     let config = Arc::new(ExtractorConfig::load(None)?);
//!     let warehouse = Arc::new(DuckDbWarehouse::open(&config.warehouse_path)?);
//!     let budget = CallBudget::new(config.api_call_limit);
//!     let fetcher = Arc::new(HttpPageFetcher::from_config(&config, budget)?);
//!
//!     let extractor = Extractor::new(
//!         config,
//!         fetcher,
//!         warehouse.clone(),
//!         CheckpointResolver::new(warehouse),
//!     );
//!     let summary = extractor.run(DataType::Receipts).await?;
//!     println!("{} rows in {} calls", summary.rows_loaded, summary.calls_issued);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │               CLI (run / checkpoint / serve)             │
//! └────────────────────────────┬─────────────────────────────┘
//!                              │
//! ┌────────────────────────────┴─────────────────────────────┐
//! │                 Extractor (engine::run)                  │
//! │  checkpoint → fetch page → insert rows → next cursor     │
//! └───────┬──────────────────────┬──────────────────┬────────┘
//!         │                      │                  │
//! ┌───────┴───────┐   ┌──────────┴────────┐  ┌──────┴───────┐
//! │ fetch + http  │   │     warehouse     │  │  checkpoint  │
//! │ budget, pace  │   │  DuckDB, append   │  │  max(id) row │
//! └───────────────┘   └───────────────────┘  └──────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Configuration and data type registry
pub mod config;

/// Pagination cursors and query parameters
pub mod cursor;

/// HTTP client, call budget and pacing
pub mod http;

/// Page fetching
pub mod fetch;

/// DuckDB sink and checkpoint query
pub mod warehouse;

/// Resume point resolution
pub mod checkpoint;

/// Extraction loop
pub mod engine;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
