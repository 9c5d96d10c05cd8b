//! CLI module
//!
//! Command-line interface for running extractions.
//!
//! # Commands
//!
//! - `run` - Extract one data type, or all of them in order
//! - `checkpoint` - Show the cursor the next run resumes from
//! - `data-types` - List supported data types
//! - `serve` - Start HTTP server mode

mod commands;
mod runner;
mod server;

pub use commands::{Cli, Commands};
pub use runner::{error_report, Runner};
pub use server::{app, serve, ServerConfig};
