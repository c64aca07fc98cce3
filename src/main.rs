#![forbid(unsafe_code)]
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use metricmon::bus::init_event_bus;
use metricmon::config::{self, load_configuration};
use metricmon::datamodel::{Metric, MetricStatus};
use metricmon::lifecycle::{ExportSpec, MetricLifecycleController, data_points_from_json};
use metricmon::storage::storage_factory::create_storage_from_connection_string;
use serde::Serialize;
use serde_json::{Value as JsonValue, json};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::{Level, event};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "metricmon", version, about = "Metric monitoring lifecycle")]
struct Cli {
    /// Overrides the configured datasource.
    #[arg(long, global = true)]
    datasource: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Register a new unmonitored metric
    Create { name: String },
    /// Start monitoring with a model spec read from a JSON file ("-" for stdin)
    Monitor { spec: PathBuf },
    /// Stop monitoring a metric
    Unmonitor { uid: Uuid },
    /// Delete a metric and its data
    Delete { name: String },
    /// Request a model without waiting for the record threshold
    Activate { uid: Uuid },
    /// Append `[[value, timestamp], ...]` data points from a JSON file
    Ingest { uid: Uuid, data: PathBuf },
    /// Export a metric with its data
    Export {
        uid: Uuid,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import a previously exported metric
    Import { file: PathBuf },
    /// Show one metric by uid or name
    Show { metric: String },
    /// List metrics of the datasource
    List {
        #[arg(long)]
        status: Option<MetricStatus>,
    },
}

fn main() -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    load_configuration().context("Failed to load configuration")?;
    let config = config::get().context("Failed to get configuration")?;

    // Initialize Sentry if DSN is provided
    let _sentry = config.sentry_dsn.as_ref().map(|dsn| {
        sentry::init((
            dsn.clone(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let storage = create_storage_from_connection_string(&config.storage_connection_string)
        .await
        .context("Failed to create storage backend")?;
    storage
        .create_or_migrate()
        .await
        .context("Failed to create or migrate database schema")?;

    let datasource = cli
        .datasource
        .clone()
        .unwrap_or_else(|| config.datasource.clone());
    let controller = MetricLifecycleController::new(
        datasource,
        storage,
        Arc::new(config.lifecycle_settings()),
        init_event_bus(),
    );

    match run_command(&controller, cli.command).await {
        Ok(()) => Ok(()),
        Err(err) => {
            event!(Level::ERROR, "{:#}", err);
            Err(err)
        }
    }
}

async fn run_command(controller: &MetricLifecycleController, command: Command) -> Result<()> {
    match command {
        Command::Create { name } => {
            let uid = controller.create_metric(&name).await?;
            print_json(&json!({ "uid": uid }))
        }
        Command::Monitor { spec } => {
            let document = read_json(&spec).await?;
            let model_id = controller.monitor_metric(&document).await?;
            let metric = controller.get_metric(&model_id).await?;
            print_json(&metric)
        }
        Command::Unmonitor { uid } => {
            controller.unmonitor_metric(&uid).await?;
            print_json(&controller.get_metric(&uid).await?)
        }
        Command::Delete { name } => {
            controller.delete_metric_by_name(&name).await?;
            print_json(&json!({ "deleted": name }))
        }
        Command::Activate { uid } => {
            controller.activate_model(&uid).await?;
            print_json(&controller.get_metric(&uid).await?)
        }
        Command::Ingest { uid, data } => {
            let points = data_points_from_json(read_json(&data).await?)
                .context("Invalid data points")?;
            controller.add_data_points(&uid, &points).await?;
            print_json(&controller.get_metric(&uid).await?)
        }
        Command::Export { uid, output } => {
            let export = controller.export_model(&uid).await?;
            match output {
                Some(path) => {
                    let text = serde_json::to_string_pretty(&export)?;
                    tokio::fs::write(&path, text)
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))
                }
                None => print_json(&export),
            }
        }
        Command::Import { file } => {
            let export: ExportSpec =
                serde_json::from_value(read_json(&file).await?).context("Invalid export file")?;
            let uid = controller.import_model(&export).await?;
            print_json(&controller.get_metric(&uid).await?)
        }
        Command::Show { metric } => print_json(&find_metric(controller, &metric).await?),
        Command::List { status } => print_json(&controller.list_metrics(status).await?),
    }
}

async fn find_metric(controller: &MetricLifecycleController, metric: &str) -> Result<Metric> {
    Ok(match Uuid::parse_str(metric) {
        Ok(uid) => controller.get_metric(&uid).await?,
        Err(_) => controller.get_metric_by_name(metric).await?,
    })
}

async fn read_json(path: &PathBuf) -> Result<JsonValue> {
    let text = if path.as_os_str() == "-" {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("Failed to read stdin")?;
        text
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?
    };
    serde_json::from_str(&text).context("Invalid JSON document")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_list_status() {
        let cli = Cli::try_parse_from(["metricmon", "list", "--status", "pending_data"]).unwrap();
        match cli.command {
            Command::List { status } => assert_eq!(status, Some(MetricStatus::PendingData)),
            other => panic!("Unexpected command: {:?}", other),
        }
    }
}
