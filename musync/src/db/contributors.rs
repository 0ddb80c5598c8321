//! Contributor (maintainer) get-or-create

use crate::error::SyncResult;
use sqlx::SqliteConnection;
use tracing::info;

/// Resolve a maintainer name to a contributor id, creating the row if needed
///
/// Returns `None` when there is no name to resolve. Email and url are stored
/// only when the row is created; later documents never change them.
pub async fn resolve_contributor(
    conn: &mut SqliteConnection,
    name: Option<&str>,
    email: Option<&str>,
    url: Option<&str>,
) -> SyncResult<Option<i64>> {
    let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };

    info!("Looking for contributor {}", name);

    let existing: Option<i64> =
        sqlx::query_scalar("SELECT id FROM mutopia_contributor WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;

    if let Some(id) = existing {
        info!(" found as id {}", id);
        return Ok(Some(id));
    }

    // INTEGER PRIMARY KEY: SQLite assigns max(id) + 1 under the write lock
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO mutopia_contributor (name, email, url) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(name)
    .bind(email.unwrap_or_default())
    .bind(url.unwrap_or_default())
    .fetch_one(&mut *conn)
    .await?;

    info!("Added contributor {} with id {}", name, id);
    Ok(Some(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_connection;
    use musync_common::db::Contributor;
    use sqlx::Row;

    async fn load_contributor(conn: &mut SqliteConnection, id: i64) -> SyncResult<Option<Contributor>> {
        let row = sqlx::query("SELECT id, name, email, url FROM mutopia_contributor WHERE id = ?")
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(row.map(|row| Contributor {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            url: row.get("url"),
        }))
    }

    #[tokio::test]
    async fn test_create_then_find_contributor() {
        let mut conn = test_connection().await;

        let first = resolve_contributor(
            &mut conn,
            Some("Jane Engraver"),
            Some("jane@example.org"),
            Some("http://example.org"),
        )
        .await
        .unwrap()
        .expect("contributor created");

        let second = resolve_contributor(&mut conn, Some("Jane Engraver"), None, None)
            .await
            .unwrap();
        assert_eq!(second, Some(first));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM mutopia_contributor")
            .fetch_one(&mut conn)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_contact_details_not_updated() {
        let mut conn = test_connection().await;

        let id = resolve_contributor(&mut conn, Some("Jane"), Some("old@example.org"), Some("http://old"))
            .await
            .unwrap()
            .unwrap();
        resolve_contributor(&mut conn, Some("Jane"), Some("new@example.org"), Some("http://new"))
            .await
            .unwrap();

        let stored = load_contributor(&mut conn, id).await.unwrap().unwrap();
        assert_eq!(stored.email, "old@example.org");
        assert_eq!(stored.url, "http://old");
    }

    #[tokio::test]
    async fn test_new_id_follows_existing_max() {
        let mut conn = test_connection().await;
        sqlx::query("INSERT INTO mutopia_contributor (id, name) VALUES (41, 'Existing')")
            .execute(&mut conn)
            .await
            .unwrap();

        let id = resolve_contributor(&mut conn, Some("Newcomer"), None, None)
            .await
            .unwrap();
        assert_eq!(id, Some(42));

        let stored = load_contributor(&mut conn, 42).await.unwrap().unwrap();
        assert_eq!(stored.email, "");
        assert_eq!(stored.url, "");
    }

    #[tokio::test]
    async fn test_missing_name_does_not_resolve() {
        let mut conn = test_connection().await;

        assert_eq!(resolve_contributor(&mut conn, None, None, None).await.unwrap(), None);
        assert_eq!(resolve_contributor(&mut conn, Some("   "), None, None).await.unwrap(), None);
    }
}
