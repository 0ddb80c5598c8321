//! Search view refresh
//!
//! `mutopia_search_view` is a denormalized copy of the catalog used for
//! full-text search. It is rebuilt from scratch after every run.

use crate::error::SyncResult;
use sqlx::SqliteConnection;
use tracing::info;

/// Rebuild the search view, returning the number of rows written
pub async fn refresh_search_view(conn: &mut SqliteConnection) -> SyncResult<u64> {
    info!("Refreshing search view");

    sqlx::query("DELETE FROM mutopia_search_view")
        .execute(&mut *conn)
        .await?;

    let rows = sqlx::query(
        r#"
        INSERT INTO mutopia_search_view (piece_id, title, composer, style, instruments, document)
        SELECT
            p.piece_id,
            p.title,
            p.composer_id,
            p.style_id,
            COALESCE(
                (SELECT group_concat(pi.instrument_id, ' ')
                 FROM mutopia_piece_instruments pi
                 WHERE pi.piece_id = p.piece_id),
                ''
            ),
            lower(p.title || ' ' || p.composer_id || ' ' || p.style_id || ' ' ||
                  p.raw_instrument || ' ' || p.opus || ' ' || p.lyricist || ' ' || p.source)
        FROM mutopia_piece p
        "#,
    )
    .execute(&mut *conn)
    .await?
    .rows_affected();

    Ok(rows)
}
