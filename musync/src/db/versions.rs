//! LilyPond version get-or-create

use crate::error::SyncResult;
use sqlx::SqliteConnection;
use tracing::info;

/// Split a version string into (major, minor, edit)
///
/// At most three parts; anything past the second dot stays in `edit`.
/// Missing parts are empty.
pub fn split_version(version: &str) -> (String, String, String) {
    let mut parts = version.splitn(3, '.').map(str::to_string);
    (
        parts.next().unwrap_or_default(),
        parts.next().unwrap_or_default(),
        parts.next().unwrap_or_default(),
    )
}

/// Resolve a version string to its id, creating the row if needed
///
/// Returns `None` when the document names no version.
pub async fn resolve_version(conn: &mut SqliteConnection, version: Option<&str>) -> SyncResult<Option<i64>> {
    let Some(version) = version.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    let existing: Option<i64> =
        sqlx::query_scalar("SELECT id FROM mutopia_lpversion WHERE version = ?")
            .bind(version)
            .fetch_optional(&mut *conn)
            .await?;

    if existing.is_some() {
        return Ok(existing);
    }

    let (major, minor, edit) = split_version(version);
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO mutopia_lpversion (version, major, minor, edit)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(version)
    .bind(major)
    .bind(minor)
    .bind(edit)
    .fetch_one(&mut *conn)
    .await?;

    info!("Added LilyPond version {} with id {}", version, id);
    Ok(Some(id))
}
