//! Catalog database fixtures

use sqlx::{Connection, SqliteConnection};

/// In-memory catalog with the full schema and the reference tables seeded
pub async fn test_catalog() -> SqliteConnection {
    let mut conn = SqliteConnection::connect("sqlite::memory:").await.unwrap();
    musync_common::db::create_schema(&mut conn).await.unwrap();

    sqlx::query("INSERT INTO mutopia_license (name) VALUES ('Public Domain'), ('Creative Commons Attribution 4.0')")
        .execute(&mut conn)
        .await
        .unwrap();
    sqlx::query("INSERT INTO mutopia_instrument (instrument) VALUES ('Piano'), ('Violin'), ('Keyboard')")
        .execute(&mut conn)
        .await
        .unwrap();
    sqlx::query("INSERT INTO update_instrumentmap (raw_instrument, instrument_id) VALUES ('harpsichord', 'Keyboard')")
        .execute(&mut conn)
        .await
        .unwrap();

    conn
}

/// Add a harvested entry to the backlog, returning its id
pub async fn add_entry(conn: &mut SqliteConnection, folder: &str, name: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO mutopia_assetmap (folder, name, has_lys) VALUES (?, ?, 1) RETURNING id")
        .bind(folder)
        .bind(name)
        .fetch_one(conn)
        .await
        .unwrap()
}

/// Piece id an entry was published as, if any
pub async fn published_as(conn: &mut SqliteConnection, entry_id: i64) -> Option<String> {
    sqlx::query_scalar("SELECT piece_id FROM mutopia_assetmap WHERE id = ?")
        .bind(entry_id)
        .fetch_one(conn)
        .await
        .unwrap()
}

pub async fn count(conn: &mut SqliteConnection, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(conn)
        .await
        .unwrap()
}
