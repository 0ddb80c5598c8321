//! Harvest backlog
//!
//! The backlog is every `mutopia_assetmap` row whose `piece_id` is still NULL.
//! Rejected entries are not marked in any way, so they come back on the next
//! run.

use crate::error::SyncResult;
use musync_common::db::PendingEntry;
use sqlx::{Row, SqliteConnection};

/// Load up to `limit` unpublished entries in id order (0 = no limit)
pub async fn load_backlog(conn: &mut SqliteConnection, limit: u32) -> SyncResult<Vec<PendingEntry>> {
    // SQLite treats a negative LIMIT as unbounded
    let limit = if limit == 0 { -1 } else { i64::from(limit) };

    let rows = sqlx::query(
        r#"
        SELECT id, folder, name, has_lys, piece_id
        FROM mutopia_assetmap
        WHERE piece_id IS NULL
        ORDER BY id
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(conn)
    .await?;

    rows.into_iter()
        .map(|row| -> SyncResult<PendingEntry> {
            Ok(PendingEntry {
                entry_id: row.try_get("id")?,
                folder: row.try_get("folder")?,
                name: row.try_get("name")?,
                has_lys: row.try_get("has_lys")?,
                piece_id: row.try_get("piece_id")?,
            })
        })
        .collect()
}

/// Record the piece each entry was published as
pub async fn mark_published(conn: &mut SqliteConnection, published: &[(String, i64)]) -> SyncResult<u64> {
    let mut updated = 0;
    for (piece_id, entry_id) in published {
        updated += sqlx::query("UPDATE mutopia_assetmap SET piece_id = ? WHERE id = ?")
            .bind(piece_id)
            .bind(entry_id)
            .execute(&mut *conn)
            .await?
            .rows_affected();
    }

    Ok(updated)
}

/// Number of entries still awaiting publication
pub async fn backlog_size(conn: &mut SqliteConnection) -> SyncResult<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM mutopia_assetmap WHERE piece_id IS NULL")
        .fetch_one(conn)
        .await?;

    Ok(count)
}
