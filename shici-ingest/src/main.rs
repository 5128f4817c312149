//! shici-ingest - load the chinese-poetry corpus into SQLite

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use shici_common::config::{self, TomlConfig};
use shici_common::db::init_database;
use shici_ingest::{IngestJob, IngestOptions};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for shici-ingest
#[derive(Parser, Debug)]
#[command(name = "shici-ingest")]
#[command(about = "Load the chinese-poetry corpus into the relational store")]
#[command(version)]
struct Args {
    /// Root of the chinese-poetry source tree
    #[arg(short, long, env = "SHICI_DATA_PATH")]
    data_path: Option<PathBuf>,

    /// SQLite database file to populate
    #[arg(long, env = "SHICI_DB_PATH")]
    db_path: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, env = "SHICI_CONFIG")]
    config: Option<PathBuf>,

    /// Keep existing corpus rows instead of clearing them first
    #[arg(long)]
    keep_existing: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let toml = TomlConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("shici_ingest={0},shici_common={0}", toml.logging.level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let data_path = config::resolve(args.data_path, toml.data_path, PathBuf::from(config::DEFAULT_DATA_PATH));
    let db_path = config::resolve(args.db_path, toml.database_path, PathBuf::from(config::DEFAULT_DB_PATH));

    info!("Data path: {}", data_path.display());
    info!("Database path: {}", db_path.display());

    anyhow::ensure!(
        data_path.is_dir(),
        "data path {} is not a directory",
        data_path.display()
    );

    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    let mut job = IngestJob::new(pool.clone(), data_path);
    let report = job
        .run(IngestOptions {
            reset: !args.keep_existing,
        })
        .await
        .context("Ingestion failed")?;

    info!(
        "Done: {} collections, {} files ({} skipped), {} works, {} comments, {} authors",
        report.collections,
        report.files,
        report.files_skipped,
        report.works,
        report.comments,
        report.authors
    );

    pool.close().await;
    Ok(())
}
