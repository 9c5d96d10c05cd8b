//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Incremental FEC schedule extractor
#[derive(Parser, Debug)]
#[command(name = "fec-extract")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML); `FEC_*` environment variables override it
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// DuckDB warehouse file (defaults to `<dataset>.duckdb`)
    #[arg(short, long, global = true)]
    pub warehouse: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract new records into the warehouse
    Run {
        /// Data type to extract (receipts, disbursements); all when omitted
        #[arg(short, long)]
        data_type: Option<String>,
    },

    /// Print the cursor the next run would resume from
    Checkpoint {
        /// Data type whose checkpoint to resolve
        #[arg(short, long)]
        data_type: String,
    },

    /// List supported data types
    DataTypes,

    /// Start HTTP server mode
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "5000")]
        port: u16,
    },
}
