//! Database initialization
//!
//! Opens (or creates) the SQLite catalog and brings the schema up to date.
//! Every statement is `CREATE ... IF NOT EXISTS`, so initialization is safe to
//! repeat on an existing catalog.

use crate::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{SqliteConnection, SqlitePool};
use std::path::Path;
use tracing::info;

/// Open the catalog database and create any missing tables
///
/// The pool holds a single connection: a sync run is single-writer and
/// sequential, and nothing else in the process touches the catalog.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new catalog database: {}", db_path.display());
    } else {
        info!("Opened existing catalog database: {}", db_path.display());
    }

    let mut conn = pool.acquire().await?;

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&mut *conn)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&mut *conn)
        .await?;

    // A second run started while one is in progress waits this long for the
    // write lock, then fails instead of interleaving id allocation.
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&mut *conn)
        .await?;

    create_schema(&mut conn).await?;

    Ok(pool)
}

/// Create every catalog table that does not exist yet
pub async fn create_schema(conn: &mut SqliteConnection) -> Result<()> {
    // Reference ("dimension") tables
    create_license_table(conn).await?;
    create_contributor_table(conn).await?;
    create_lpversion_table(conn).await?;
    create_instrument_table(conn).await?;
    create_instrument_alias_table(conn).await?;

    // Catalog and linking tables
    create_piece_table(conn).await?;
    create_piece_instruments_table(conn).await?;

    // Harvest backlog, search view, run journal
    create_assetmap_table(conn).await?;
    create_search_view_table(conn).await?;
    create_runs_table(conn).await?;

    Ok(())
}

pub async fn create_license_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS mutopia_license (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn create_contributor_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS mutopia_contributor (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL DEFAULT '',
            url TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn create_lpversion_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS mutopia_lpversion (
            id INTEGER PRIMARY KEY,
            version TEXT NOT NULL UNIQUE,
            major TEXT NOT NULL DEFAULT '',
            minor TEXT NOT NULL DEFAULT '',
            edit TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn create_instrument_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS mutopia_instrument (
            instrument TEXT PRIMARY KEY
        )
        "#,
    )
    .execute(conn)
    .await?;

    Ok(())
}

/// Synonyms for instrument names that are not in canonical form.
/// `raw_instrument` is stored lowercase.
pub async fn create_instrument_alias_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS update_instrumentmap (
            raw_instrument TEXT PRIMARY KEY,
            instrument_id TEXT NOT NULL REFERENCES mutopia_instrument(instrument)
        )
        "#,
    )
    .execute(conn)
    .await?;

    Ok(())
}

/// Column order here is the insert order used by the reconciler.
pub async fn create_piece_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS mutopia_piece (
            piece_id TEXT PRIMARY KEY,
            title TEXT NOT NULL DEFAULT '',
            raw_instrument TEXT NOT NULL DEFAULT '',
            opus TEXT NOT NULL DEFAULT '',
            lyricist TEXT NOT NULL DEFAULT '',
            date_composed TEXT NOT NULL DEFAULT '',
            date_published TEXT NOT NULL,
            source TEXT NOT NULL DEFAULT '',
            moreinfo TEXT NOT NULL DEFAULT '',
            composer_id TEXT NOT NULL DEFAULT '',
            license_id INTEGER REFERENCES mutopia_license(id),
            maintainer_id INTEGER NOT NULL REFERENCES mutopia_contributor(id),
            style_id TEXT NOT NULL DEFAULT '',
            version_id INTEGER REFERENCES mutopia_lpversion(id)
        )
        "#,
    )
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn create_piece_instruments_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS mutopia_piece_instruments (
            id INTEGER PRIMARY KEY,
            piece_id TEXT NOT NULL REFERENCES mutopia_piece(piece_id) ON DELETE CASCADE,
            instrument_id TEXT NOT NULL REFERENCES mutopia_instrument(instrument),
            UNIQUE(piece_id, instrument_id)
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_piece_instruments_piece ON mutopia_piece_instruments(piece_id)",
    )
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Harvested entries. `piece_id` stays NULL until the entry is published.
pub async fn create_assetmap_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS mutopia_assetmap (
            id INTEGER PRIMARY KEY,
            folder TEXT NOT NULL,
            name TEXT NOT NULL,
            has_lys INTEGER NOT NULL DEFAULT 0,
            piece_id TEXT
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_assetmap_piece ON mutopia_assetmap(piece_id)",
    )
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Denormalized full-text source, rebuilt wholesale at the end of each run
pub async fn create_search_view_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS mutopia_search_view (
            piece_id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            composer TEXT NOT NULL,
            style TEXT NOT NULL,
            instruments TEXT NOT NULL,
            document TEXT NOT NULL
        )
        "#,
    )
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn create_runs_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS musync_runs (
            id INTEGER PRIMARY KEY,
            started_at TEXT NOT NULL,
            finished_at TEXT,
            batch_limit INTEGER NOT NULL DEFAULT 0,
            published INTEGER NOT NULL DEFAULT 0,
            skipped INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(conn)
    .await?;

    Ok(())
}
