//! Error types for fec-extract
//!
//! Every fallible operation in the crate returns `Result<T, Error>`.
//! Core errors propagate to the caller unmodified, with the cause attached;
//! nothing in the extraction engine retries or swallows an error.

use serde::Serialize;
use thiserror::Error;

/// The main error type
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Extraction Errors
    // ============================================================================
    #[error("Invalid data_type '{value}'. Choose 'receipts' or 'disbursements'.")]
    InvalidDataType { value: String },

    #[error("API call limit of {limit} reached; the budget lasts for the life of the process, restart to reset it")]
    QuotaExceeded { limit: u64 },

    #[error("Failed to fetch '{endpoint}': {source}")]
    Fetch {
        endpoint: String,
        #[source]
        source: FetchFailure,
    },

    #[error("Failed to load rows into '{table}': {message}")]
    Sink { table: String, message: String },

    #[error("Checkpoint query on '{table}' failed: {message}")]
    CheckpointQuery { table: String, message: String },

    #[error("Cursor did not advance: previous last_index {previous}, next {next}")]
    CursorRegression { previous: String, next: String },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Underlying cause of a failed page fetch
#[derive(Error, Debug)]
pub enum FetchFailure {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("undecodable response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Stable, client-facing classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidDataType,
    QuotaExceeded,
    Fetch,
    Sink,
    CheckpointQuery,
    CursorRegression,
    Config,
    Internal,
}

impl ErrorKind {
    /// Snake-case name, as reported by the trigger surfaces
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidDataType => "invalid_data_type",
            Self::QuotaExceeded => "quota_exceeded",
            Self::Fetch => "fetch",
            Self::Sink => "sink",
            Self::CheckpointQuery => "checkpoint_query",
            Self::CursorRegression => "cursor_regression",
            Self::Config => "config",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an invalid data type error
    pub fn invalid_data_type(value: impl Into<String>) -> Self {
        Self::InvalidDataType {
            value: value.into(),
        }
    }

    /// Create a fetch error from any fetch failure
    pub fn fetch(endpoint: impl Into<String>, source: impl Into<FetchFailure>) -> Self {
        Self::Fetch {
            endpoint: endpoint.into(),
            source: source.into(),
        }
    }

    /// Create a sink error
    pub fn sink(table: impl Into<String>, message: impl ToString) -> Self {
        Self::Sink {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Create a checkpoint query error
    pub fn checkpoint(table: impl Into<String>, message: impl ToString) -> Self {
        Self::CheckpointQuery {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Classify this error for reporting
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidDataType { .. } => ErrorKind::InvalidDataType,
            Error::QuotaExceeded { .. } => ErrorKind::QuotaExceeded,
            Error::Fetch { .. } => ErrorKind::Fetch,
            Error::Sink { .. } => ErrorKind::Sink,
            Error::CheckpointQuery { .. } => ErrorKind::CheckpointQuery,
            Error::CursorRegression { .. } => ErrorKind::CursorRegression,
            Error::Config { .. }
            | Error::MissingConfigField { .. }
            | Error::InvalidConfigValue { .. }
            | Error::YamlParse(_) => ErrorKind::Config,
            Error::JsonParse(_) | Error::Io(_) | Error::Other(_) => ErrorKind::Internal,
        }
    }

    /// HTTP status code of the upstream response, if this is a status failure
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Error::Fetch {
                source: FetchFailure::Status { status, .. },
                ..
            } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for fec-extract
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }
}
