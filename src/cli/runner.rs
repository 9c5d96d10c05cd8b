//! CLI runner - executes commands

use crate::checkpoint::CheckpointResolver;
use crate::cli::commands::{Cli, Commands};
use crate::cli::server::{serve, ServerConfig};
use crate::config::{DataType, ExtractorConfig};
use crate::engine::Extractor;
use crate::error::{Error, Result, ResultExt};
use crate::fetch::HttpPageFetcher;
use crate::http::CallBudget;
use crate::warehouse::DuckDbWarehouse;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// CLI runner
pub struct Runner {
    cli: Cli,
    cancel: CancellationToken,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self {
            cli,
            cancel: CancellationToken::new(),
        }
    }

    /// Token cancelled on shutdown; stops extraction between pages
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Run { data_type } => self.extract(data_type.as_deref()).await,
            Commands::Checkpoint { data_type } => self.checkpoint(data_type).await,
            Commands::DataTypes => {
                print_json(&data_types_json());
                Ok(())
            }
            Commands::Serve { port } => {
                let config = ServerConfig::new(Arc::new(self.load_config()?));
                serve(config, *port, self.cancel.clone()).await
            }
        }
    }

    /// Load config, applying the `--warehouse` override
    fn load_config(&self) -> Result<ExtractorConfig> {
        let mut config = ExtractorConfig::load(self.cli.config.as_deref())?;
        if let Some(path) = &self.cli.warehouse {
            config.warehouse_path = path.clone();
        }
        if self.cli.verbose {
            tracing::debug!(config = ?config, "Loaded configuration");
        }
        Ok(config)
    }

    async fn extract(&self, data_type: Option<&str>) -> Result<()> {
        // Reject a bad selector before opening anything
        let data_types = match data_type {
            Some(name) => vec![name.parse::<DataType>()?],
            None => DataType::ALL.to_vec(),
        };

        let config = Arc::new(self.load_config()?);
        let warehouse = open_warehouse(&config)?;
        let budget = CallBudget::new(config.api_call_limit);
        let extractor = build_extractor(config, warehouse, budget)?
            .with_cancellation(self.cancel.clone());

        for summary in extractor.run_all(&data_types).await? {
            let value =
                serde_json::to_value(&summary).context("Failed to serialize run summary")?;
            print_json(&value);
        }
        Ok(())
    }

    async fn checkpoint(&self, data_type: &str) -> Result<()> {
        let data_type: DataType = data_type.parse()?;
        let config = self.load_config()?;
        let table = config.table_for(data_type)?;
        let warehouse = open_warehouse(&config)?;

        let cursor = CheckpointResolver::new(warehouse)
            .resolve(&table, data_type.config())
            .await?;

        print_json(&json!({
            "data_type": data_type,
            "table": table.to_string(),
            "cursor": cursor,
        }));
        Ok(())
    }
}

/// Open the warehouse the config points at
pub(crate) fn open_warehouse(config: &ExtractorConfig) -> Result<Arc<DuckDbWarehouse>> {
    Ok(Arc::new(DuckDbWarehouse::open(&config.warehouse_path)?))
}

/// One-line failure report naming the error kind, as printed to stderr
pub fn error_report(err: &Error) -> String {
    format!("Error [{}]: {err}", err.kind())
}

/// Wire an extractor over the HTTP fetcher and a DuckDB warehouse
pub(crate) fn build_extractor(
    config: Arc<ExtractorConfig>,
    warehouse: Arc<DuckDbWarehouse>,
    budget: CallBudget,
) -> Result<Extractor> {
    let fetcher = Arc::new(HttpPageFetcher::from_config(&config, budget)?);
    Ok(Extractor::new(
        config,
        fetcher,
        warehouse.clone(),
        CheckpointResolver::new(warehouse),
    ))
}

/// Supported data types and where they land
pub(crate) fn data_types_json() -> Value {
    Value::Array(
        DataType::ALL
            .iter()
            .map(|dt| {
                let cfg = dt.config();
                json!({
                    "name": cfg.name,
                    "endpoint": cfg.endpoint,
                    "table": cfg.table,
                    "ordering_field": cfg.ordering_field,
                    "id_field": cfg.id_field,
                    "cursor_fields": cfg.cursor_fields,
                })
            })
            .collect(),
    )
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(_) => println!("{value}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_data_types_json() {
        let listed = data_types_json();
        let names: Vec<&str> = listed
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["receipts", "disbursements"]);
        assert_eq!(listed[1]["endpoint"], "schedules/schedule_b");
        assert_eq!(
            listed[0]["cursor_fields"],
            json!(["last_index", "last_contribution_receipt_date"])
        );
    }

    #[tokio::test]
    async fn test_invalid_data_type_fails_before_config() {
        // No FEC_API_KEY needed: the selector is rejected first
        let cli = <Cli as clap::Parser>::try_parse_from([
            "fec-extract",
            "run",
            "--data-type",
            "contributions",
        ])
        .unwrap();
        let err = Runner::new(cli).run().await.unwrap_err();
        assert_eq!(err.kind().as_str(), "invalid_data_type");
        assert!(error_report(&err).starts_with("Error [invalid_data_type]: "));
    }

    #[tokio::test]
    async fn test_unreadable_config_reports_config_kind() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.yaml");
        let cli = <Cli as clap::Parser>::try_parse_from([
            "fec-extract",
            "--config",
            missing.to_str().unwrap(),
            "checkpoint",
            "--data-type",
            "receipts",
        ])
        .unwrap();

        let err = Runner::new(cli).run().await.unwrap_err();

        assert_eq!(err.kind().as_str(), "config");
        assert!(error_report(&err).starts_with("Error [config]: Configuration error: Failed to read config file"));
    }

    #[test]
    fn test_error_report_names_quota_kind() {
        let report = error_report(&Error::QuotaExceeded { limit: 3 });
        assert!(report.starts_with("Error [quota_exceeded]: API call limit of 3 reached"));
    }
}
