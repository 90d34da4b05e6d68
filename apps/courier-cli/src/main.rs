//! # courier-sync
//!
//! Refreshes one courier provider's city → zone → area catalog.
//!
//! ```text
//! $ courier-sync --provider pathao
//! Starting courier data sync for provider: pathao...
//! Successfully stored 1234 Pathao records in 25 batches
//! Processed 1234 records
//! ```
//!
//! Exit code is 0 when the run succeeded and 1 otherwise. Logs go to
//! stderr and honour `RUST_LOG`.

use anyhow::Context;
use clap::Parser;
use courier_core::SyncReport;
use courier_db::{Database, DbConfig};
use courier_sync::{CourierConfig, ProviderRegistry, SyncEngine};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "courier-sync",
    version,
    about = "Sync courier provider data from the provider's API"
)]
struct Cli {
    /// Courier provider name
    #[arg(long, env = "COURIER_PROVIDER", default_value = "pathao")]
    provider: String,

    /// Path to courier.toml (defaults to the platform config directory)
    #[arg(long, env = "COURIER_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file, overriding the configured path
    #[arg(long)]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let provider = cli.provider.trim().to_lowercase();
    println!("Starting courier data sync for provider: {provider}...");

    match run(&provider, cli.config, cli.database).await {
        Ok(report) if report.success => {
            println!("{}", report.message);
            println!("Processed {} records", report.processed_count);
            ExitCode::SUCCESS
        }
        Ok(report) => {
            eprintln!("{}", report.message);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,courier=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(
    provider: &str,
    config_path: Option<PathBuf>,
    database: Option<PathBuf>,
) -> anyhow::Result<SyncReport> {
    // Unknown providers are rejected before any configuration is read.
    let registry = ProviderRegistry::with_defaults();
    registry.resolve(provider)?;

    let mut config = CourierConfig::load(config_path).context("Failed to load configuration")?;
    if let Some(path) = database {
        config.database.path = Some(path);
    }

    let db_path = config.database_path();
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory {}", parent.display()))?;
    }
    debug!(path = %db_path.display(), "Opening database");

    let db = Database::new(DbConfig::new(db_path))
        .await
        .context("Failed to open database")?;

    let engine = SyncEngine::new(config, db.clone()).with_registry(registry);
    let result = engine.sync(provider).await;
    db.close().await;

    let report = result?;
    info!(
        success = report.success,
        processed = report.processed_count,
        batches = report.batch_count,
        "Sync finished"
    );
    Ok(report)
}
