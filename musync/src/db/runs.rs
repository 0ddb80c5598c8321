//! Run journal
//!
//! Each run opens with an insert into `musync_runs`. Being the first write of
//! the run's transaction, it takes SQLite's write lock up front and holds it
//! until commit, so two runs can never interleave surrogate id allocation.

use crate::error::SyncResult;
use chrono::Utc;
use sqlx::SqliteConnection;

/// Record the start of a run and return its id
pub async fn begin_run(conn: &mut SqliteConnection, batch_limit: u32) -> SyncResult<i64> {
    let id = sqlx::query_scalar(
        "INSERT INTO musync_runs (started_at, batch_limit) VALUES (?, ?) RETURNING id",
    )
    .bind(Utc::now())
    .bind(i64::from(batch_limit))
    .fetch_one(conn)
    .await?;

    Ok(id)
}

/// Close a run with its final counts
pub async fn finish_run(
    conn: &mut SqliteConnection,
    run_id: i64,
    published: usize,
    skipped: usize,
) -> SyncResult<()> {
    sqlx::query(
        "UPDATE musync_runs SET finished_at = ?, published = ?, skipped = ? WHERE id = ?",
    )
    .bind(Utc::now())
    .bind(published as i64)
    .bind(skipped as i64)
    .bind(run_id)
    .execute(conn)
    .await?;

    Ok(())
}
