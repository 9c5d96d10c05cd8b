//! Configuration
//!
//! Two layers:
//!
//! - [`DataType`] / [`DataTypeConfig`]: the closed, static set of FEC
//!   schedules this extractor knows how to page through.
//! - [`ExtractorConfig`]: process-wide settings (credential, limits,
//!   warehouse location), built once at startup from an optional YAML file
//!   plus environment variables, then shared read-only.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Data Types
// ============================================================================

/// A supported extraction target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Schedule A: itemized receipts
    Receipts,
    /// Schedule B: itemized disbursements
    Disbursements,
}

/// Static description of one data type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataTypeConfig {
    /// Selector name (`receipts`, `disbursements`)
    pub name: &'static str,
    /// API resource path, relative to the base URL
    pub endpoint: &'static str,
    /// Destination table name inside the dataset
    pub table: &'static str,
    /// Date field the API sorts by
    pub ordering_field: &'static str,
    /// Record field holding the monotonic id (`last_index` refers to it)
    pub id_field: &'static str,
    /// Cursor parameter names; the first one is the monotonic id
    pub cursor_fields: &'static [&'static str],
}

const RECEIPTS: DataTypeConfig = DataTypeConfig {
    name: "receipts",
    endpoint: "schedules/schedule_a",
    table: "temp_a",
    ordering_field: "contribution_receipt_date",
    id_field: "sub_id",
    cursor_fields: &["last_index", "last_contribution_receipt_date"],
};

const DISBURSEMENTS: DataTypeConfig = DataTypeConfig {
    name: "disbursements",
    endpoint: "schedules/schedule_b",
    table: "temp_b",
    ordering_field: "disbursement_date",
    id_field: "sub_id",
    cursor_fields: &["last_index", "last_disbursement_date"],
};

impl DataType {
    /// Every data type, in the order a full extraction runs them
    pub const ALL: [DataType; 2] = [DataType::Receipts, DataType::Disbursements];

    /// Static configuration for this data type
    pub fn config(&self) -> &'static DataTypeConfig {
        match self {
            DataType::Receipts => &RECEIPTS,
            DataType::Disbursements => &DISBURSEMENTS,
        }
    }

    /// Selector name
    pub fn as_str(&self) -> &'static str {
        self.config().name
    }
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "receipts" => Ok(DataType::Receipts),
            "disbursements" => Ok(DataType::Disbursements),
            other => Err(Error::invalid_data_type(other)),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DataTypeConfig {
    /// Name of the monotonic id cursor field
    pub fn id_cursor_field(&self) -> &'static str {
        self.cursor_fields[0]
    }

    /// Name of the ordering-value cursor field
    pub fn ordering_cursor_field(&self) -> &'static str {
        self.cursor_fields[self.cursor_fields.len() - 1]
    }
}

// ============================================================================
// Table References
// ============================================================================

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex is valid")
});

/// Check that a name is safe to splice into SQL as an identifier
pub fn validate_identifier(field: &str, value: &str) -> Result<()> {
    if IDENTIFIER.is_match(value) {
        Ok(())
    } else {
        Err(Error::invalid_value(
            field,
            format!("'{value}' is not a valid identifier"),
        ))
    }
}

/// Fully qualified destination table (`dataset.table`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    /// Dataset (DuckDB schema)
    pub dataset: String,
    /// Table name
    pub table: String,
}

impl TableRef {
    /// Create a validated table reference
    pub fn new(dataset: impl Into<String>, table: impl Into<String>) -> Result<Self> {
        let dataset = dataset.into();
        let table = table.into();
        validate_identifier("dataset", &dataset)?;
        validate_identifier("table", &table)?;
        Ok(Self { dataset, table })
    }

    /// Quoted SQL name
    pub fn sql_name(&self) -> String {
        format!("\"{}\".\"{}\"", self.dataset, self.table)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.dataset, self.table)
    }
}

// ============================================================================
// Extractor Config
// ============================================================================

/// Default FEC API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.open.fec.gov/v1/";
/// Default ceiling on API calls per process
pub const DEFAULT_API_CALL_LIMIT: u64 = 1000;
/// Largest page the FEC API serves
pub const MAX_PAGE_SIZE: u32 = 100;
/// Default committee filter (AIPAC PAC)
pub const DEFAULT_COMMITTEE_ID: &str = "C00797670";
/// Default dataset name
pub const DEFAULT_DATASET: &str = "aipac";

/// Settings as they appear in the YAML config file; every field optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_call_limit: Option<u64>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub committee_id: Option<String>,
    #[serde(default)]
    pub dataset: Option<String>,
    #[serde(default)]
    pub warehouse_path: Option<PathBuf>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub requests_per_second: Option<u32>,
    #[serde(default)]
    pub strict_cursor_order: Option<bool>,
}

impl FileConfig {
    /// Parse a YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read and parse a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_yaml(&contents)
    }
}

/// Immutable process configuration
#[derive(Clone)]
pub struct ExtractorConfig {
    /// FEC API key
    pub api_key: String,
    /// API base URL
    pub base_url: String,
    /// Maximum API calls per process lifetime
    pub api_call_limit: u64,
    /// Records requested per page
    pub page_size: u32,
    /// Committee the extraction is filtered to
    pub committee_id: String,
    /// Warehouse dataset (DuckDB schema)
    pub dataset: String,
    /// DuckDB database file; `<dataset>.duckdb` unless set
    pub warehouse_path: PathBuf,
    /// Per-request timeout
    pub timeout: Duration,
    /// Optional pacing between API calls
    pub requests_per_second: Option<u32>,
    /// Fail the run when the server's cursor does not advance
    pub strict_cursor_order: bool,
}

impl ExtractorConfig {
    /// Create a config with defaults for everything but the API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_call_limit: DEFAULT_API_CALL_LIMIT,
            page_size: MAX_PAGE_SIZE,
            committee_id: DEFAULT_COMMITTEE_ID.to_string(),
            dataset: DEFAULT_DATASET.to_string(),
            warehouse_path: default_warehouse_path(DEFAULT_DATASET),
            timeout: Duration::from_secs(30),
            requests_per_second: None,
            strict_cursor_order: false,
        }
    }

    /// Load from an optional YAML file, then apply `FEC_*` environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };
        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    /// Merge file settings with environment lookups; the environment wins
    pub fn from_sources<F>(file: FileConfig, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = env("FEC_API_KEY")
            .or(file.api_key)
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::missing_field("FEC_API_KEY"))?;

        let mut config = Self::new(api_key);

        if let Some(url) = env("FEC_BASE_URL").or(file.base_url) {
            config.base_url = url;
        }
        if let Some(limit) = parse_env(&env, "FEC_API_CALL_LIMIT")?.or(file.api_call_limit) {
            config.api_call_limit = limit;
        }
        if let Some(size) = parse_env(&env, "FEC_PAGE_SIZE")?.or(file.page_size) {
            config.page_size = size;
        }
        if let Some(committee) = env("FEC_COMMITTEE_ID").or(file.committee_id) {
            config.committee_id = committee;
        }
        if let Some(dataset) = env("FEC_DATASET").or(file.dataset) {
            config.dataset = dataset;
        }
        config.warehouse_path = env("FEC_WAREHOUSE_PATH")
            .map(PathBuf::from)
            .or(file.warehouse_path)
            .unwrap_or_else(|| default_warehouse_path(&config.dataset));
        if let Some(secs) = file.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        config.requests_per_second = file.requests_per_second;
        config.strict_cursor_order = file.strict_cursor_order.unwrap_or(false);

        config.validate()?;
        Ok(config)
    }

    /// Check invariants the rest of the crate relies on
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::missing_field("api_key"));
        }
        url::Url::parse(&self.base_url)
            .map_err(|e| Error::invalid_value("base_url", e.to_string()))?;
        if self.api_call_limit == 0 {
            return Err(Error::invalid_value(
                "api_call_limit",
                "must be greater than zero",
            ));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(Error::invalid_value(
                "page_size",
                format!("must be between 1 and {MAX_PAGE_SIZE}"),
            ));
        }
        if self.committee_id.trim().is_empty() {
            return Err(Error::missing_field("committee_id"));
        }
        if self.requests_per_second == Some(0) {
            return Err(Error::invalid_value(
                "requests_per_second",
                "must be greater than zero",
            ));
        }
        validate_identifier("dataset", &self.dataset)
    }

    /// Destination table for a data type
    pub fn table_for(&self, data_type: DataType) -> Result<TableRef> {
        TableRef::new(&self.dataset, data_type.config().table)
    }
}

impl fmt::Debug for ExtractorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractorConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("api_call_limit", &self.api_call_limit)
            .field("page_size", &self.page_size)
            .field("committee_id", &self.committee_id)
            .field("dataset", &self.dataset)
            .field("warehouse_path", &self.warehouse_path)
            .field("timeout", &self.timeout)
            .field("requests_per_second", &self.requests_per_second)
            .field("strict_cursor_order", &self.strict_cursor_order)
            .finish()
    }
}

/// Database file used when none is configured
pub fn default_warehouse_path(dataset: &str) -> PathBuf {
    PathBuf::from(format!("{dataset}.duckdb"))
}

fn parse_env<F, T>(env: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    env(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| Error::invalid_value(key, e.to_string()))
        })
        .transpose()
}
