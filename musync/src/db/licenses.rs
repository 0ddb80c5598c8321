//! License lookup
//!
//! Licenses are reference data maintained by hand; the sync never creates one.
//! A document naming an unknown license leaves the piece's license unset.

use crate::error::SyncResult;
use sqlx::SqliteConnection;
use tracing::debug;

/// Find the id of the license with exactly this name
pub async fn find_license(conn: &mut SqliteConnection, name: Option<&str>) -> SyncResult<Option<i64>> {
    let Some(name) = name.filter(|n| !n.is_empty()) else {
        return Ok(None);
    };

    let id: Option<i64> = sqlx::query_scalar("SELECT id FROM mutopia_license WHERE name = ?")
        .bind(name)
        .fetch_optional(conn)
        .await?;

    if id.is_none() {
        debug!("No license named '{}'", name);
    }

    Ok(id)
}
