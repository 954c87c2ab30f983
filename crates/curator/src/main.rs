//! curatord: the catalog maintenance daemon.

use anyhow::Result;
use clap::Parser;
use curator::{jobs, shutdown, CuratorConfig, FilesApiClient, JobContext, RunCoordinator};
use curator_db::CuratorDb;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "curatord", about = "File catalog maintenance daemon")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, env = "CURATOR_CONFIG")]
    config: Option<PathBuf>,

    /// Catalog database path (overrides the config file).
    #[arg(long)]
    database: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "curator=debug,curator_db=debug"
    } else {
        "curator=info,curator_db=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    let mut config = match &args.config {
        Some(path) => CuratorConfig::load(path)?,
        None => CuratorConfig::default(),
    };
    if let Some(database) = args.database {
        config.database_path = database.display().to_string();
    }

    info!("Starting curatord");
    info!("  Database: {}", config.database_path);
    info!("  Watched roots: {}", config.watched_roots.len());
    info!("  Rename rules: {}", config.rename_rules.len());

    let full_scan_at = config.full_scan_at()?;
    let rename_at = config.rename_at()?;

    let db = CuratorDb::open(&config.database_path).await?;
    let api = FilesApiClient::new(config.api_base_url.as_str());
    let coordinator = RunCoordinator::new();
    let (handle, _token) = shutdown::channel();

    let ctx = JobContext {
        db,
        config,
        coordinator,
    };

    let full_scan = tokio::spawn(jobs::run_full_scan_job(
        ctx.clone(),
        full_scan_at,
        handle.token(),
    ));
    let deletion = tokio::spawn(jobs::run_deletion_job(ctx.clone(), handle.token()));
    let rename = tokio::spawn(jobs::run_rename_job(
        ctx.clone(),
        api,
        rename_at,
        handle.token(),
    ));

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received; stopping jobs");
    handle.shutdown();

    let _ = tokio::join!(full_scan, deletion, rename);

    ctx.db.close().await;
    info!("curatord stopped");
    Ok(())
}
