//! Warehouse module
//!
//! The append-only sink for ingested rows and the checkpoint query that
//! reads the resume point back out of them.
//!
//! # Overview
//!
//! - `Sink` / `CheckpointQuery` - the interfaces the extraction engine calls
//! - `DuckDbWarehouse` - both interfaces over a DuckDB database file

mod engine;
mod types;

pub use engine::DuckDbWarehouse;
pub use types::{CheckpointQuery, CheckpointRow, IngestedRow, InsertResult, Sink};
