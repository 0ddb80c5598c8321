//! musync - publish harvested entries into the Mutopia catalog
//!
//! Reads the pending backlog from the catalog database, fetches each entry's
//! metadata document from the archive and reconciles it into the piece table.
//! Entries that cannot be published stay in the backlog for the next run.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use musync::{ArchiveClient, Publisher};
use musync_common::{ConfigOverrides, SyncConfig};
use tracing::info;

/// Command-line arguments for musync
#[derive(Parser, Debug)]
#[command(name = "musync")]
#[command(about = "Synchronize published sheet music with the catalog database")]
#[command(version)]
struct Args {
    /// Maximum number of pending entries to process (0 = all)
    #[arg(short, long, default_value_t = 0)]
    limit: u32,

    /// Path to the SQLite catalog database
    #[arg(short, long, env = "MUSYNC_DATABASE")]
    database: Option<PathBuf>,

    /// Archive base URL, or a local mirror directory
    #[arg(short, long, env = "MUSYNC_ARCHIVE")]
    archive: Option<String>,

    /// TOML config file
    #[arg(short, long, env = "MUSYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Document fetch timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Also write log output to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = SyncConfig::resolve(ConfigOverrides {
        config_file: args.config,
        database_path: args.database,
        archive_base: args.archive,
        fetch_timeout_secs: args.timeout,
        log_file: args.log_file,
    })
    .context("Failed to resolve configuration")?;

    // Guard flushes the file writer on drop
    let _log_guard = musync::logging::init(&config.logging)
        .context("Failed to initialize logging")?;

    info!(
        "musync {} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Catalog database: {}", config.database_path.display());
    info!("Archive: {}", config.archive_base);

    let pool = musync::db::init_database(&config.database_path)
        .await
        .context("Failed to open catalog database")?;
    let mut conn = pool
        .acquire()
        .await
        .context("Failed to acquire database connection")?;

    let archive = ArchiveClient::from_config(&config).context("Failed to create archive client")?;
    let publisher = Publisher::new(archive);

    let report = publisher
        .run(&mut conn, args.limit)
        .await
        .context("Publish run aborted, no changes were committed")?;

    info!(
        "Published {} entries, skipped {}, {} pieces without instrument mapping, {} search rows",
        report.published().len(),
        report.skipped().len(),
        report.instruments.unmatched.len(),
        report.search_rows
    );

    drop(conn);
    pool.close().await;

    Ok(())
}
