//! Catalog database operations
//!
//! All functions take a bare `SqliteConnection` so callers decide the
//! transaction scope. A sync run passes its run transaction, or a per-entry
//! savepoint nested inside it.

pub mod contributors;
pub mod entries;
pub mod licenses;
pub mod pieces;
pub mod runs;
pub mod search_view;
pub mod versions;

pub use musync_common::db::init_database;

/// In-memory catalog with the full schema
#[cfg(test)]
pub(crate) async fn test_connection() -> sqlx::SqliteConnection {
    use sqlx::Connection;

    let mut conn = sqlx::SqliteConnection::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    musync_common::db::create_schema(&mut conn)
        .await
        .expect("Schema initialization failed");
    conn
}
