//! Piece reconciliation
//!
//! A piece is inserted whole the first time it is seen. After that, only the
//! columns whose values actually changed are written, one UPDATE per column.

use crate::document::MetadataDocument;
use crate::error::SyncResult;
use crate::identifier::MutopiaId;
use chrono::NaiveDate;
use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use sqlx::{Row, Sqlite, SqliteConnection};
use std::fmt;
use tracing::{info, warn};

/// Catalog columns in table (and insert) order
pub const PIECE_COLUMNS: [&str; 14] = [
    "piece_id",
    "title",
    "raw_instrument",
    "opus",
    "lyricist",
    "date_composed",
    "date_published",
    "source",
    "moreinfo",
    "composer_id",
    "license_id",
    "maintainer_id",
    "style_id",
    "version_id",
];

/// Canonical catalog record for one published piece
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceRecord {
    pub piece_id: String,
    pub title: String,
    pub raw_instrument: String,
    pub opus: String,
    pub lyricist: String,
    pub date_composed: String,
    pub date_published: NaiveDate,
    pub source: String,
    pub moreinfo: String,
    pub composer_id: String,
    pub license_id: Option<i64>,
    pub maintainer_id: i64,
    pub style_id: String,
    pub version_id: Option<i64>,
}

/// A single typed column value. Equality is by value and type, so an
/// integer id never equals its textual rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnValue {
    Text(String),
    Date(NaiveDate),
    Id(i64),
    OptionalId(Option<i64>),
}

impl fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnValue::Text(s) => write!(f, "{:?}", s),
            ColumnValue::Date(d) => write!(f, "{}", d),
            ColumnValue::Id(id) => write!(f, "{}", id),
            ColumnValue::OptionalId(Some(id)) => write!(f, "{}", id),
            ColumnValue::OptionalId(None) => f.write_str("NULL"),
        }
    }
}

impl ColumnValue {
    fn bind_to<'q>(
        &self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        match self {
            ColumnValue::Text(s) => query.bind(s.clone()),
            ColumnValue::Date(d) => query.bind(*d),
            ColumnValue::Id(id) => query.bind(*id),
            ColumnValue::OptionalId(id) => query.bind(*id),
        }
    }
}

/// Outcome of reconciling one record against the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Inserted,
    /// Columns rewritten, one UPDATE each
    Updated(Vec<&'static str>),
    Unchanged,
    /// Existence check passed but the row could not be read back; nothing written
    Vanished,
}

impl PieceRecord {
    /// Assemble a record from a document and its resolved references
    ///
    /// Absent text fields become empty strings.
    pub fn from_document(
        doc: &MetadataDocument,
        id: MutopiaId,
        license_id: Option<i64>,
        maintainer_id: i64,
        version_id: Option<i64>,
    ) -> Self {
        let text = |field: &Option<String>| field.clone().unwrap_or_default();

        Self {
            piece_id: id.piece_id,
            title: text(&doc.title),
            raw_instrument: text(&doc.instrumentation),
            opus: text(&doc.opus),
            lyricist: text(&doc.lyricist),
            date_composed: text(&doc.composition_date),
            date_published: id.published,
            source: text(&doc.source),
            moreinfo: text(&doc.moreinfo),
            composer_id: text(&doc.composer),
            license_id,
            maintainer_id,
            style_id: text(&doc.style),
            version_id,
        }
    }

    /// All columns with their values, in [`PIECE_COLUMNS`] order
    pub fn columns(&self) -> [(&'static str, ColumnValue); 14] {
        use ColumnValue::*;
        [
            ("piece_id", Text(self.piece_id.clone())),
            ("title", Text(self.title.clone())),
            ("raw_instrument", Text(self.raw_instrument.clone())),
            ("opus", Text(self.opus.clone())),
            ("lyricist", Text(self.lyricist.clone())),
            ("date_composed", Text(self.date_composed.clone())),
            ("date_published", Date(self.date_published)),
            ("source", Text(self.source.clone())),
            ("moreinfo", Text(self.moreinfo.clone())),
            ("composer_id", Text(self.composer_id.clone())),
            ("license_id", OptionalId(self.license_id)),
            ("maintainer_id", Id(self.maintainer_id)),
            ("style_id", Text(self.style_id.clone())),
            ("version_id", OptionalId(self.version_id)),
        ]
    }

    /// Columns (other than the key) where `self` differs from `stored`,
    /// as `(column, stored value, new value)`
    pub fn changed_columns(&self, stored: &PieceRecord) -> Vec<(&'static str, ColumnValue, ColumnValue)> {
        self.columns()
            .into_iter()
            .zip(stored.columns())
            .skip(1)
            .filter(|((_, new), (_, old))| new != old)
            .map(|((column, new), (_, old))| (column, old, new))
            .collect()
    }
}

/// True when the catalog already holds this piece
pub async fn piece_exists(conn: &mut SqliteConnection, piece_id: &str) -> SyncResult<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(piece_id) FROM mutopia_piece WHERE piece_id = ?")
        .bind(piece_id)
        .fetch_one(conn)
        .await?;

    Ok(count > 0)
}

/// Load the stored record for a piece
pub async fn load_piece(conn: &mut SqliteConnection, piece_id: &str) -> SyncResult<Option<PieceRecord>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM mutopia_piece WHERE piece_id = ?",
        PIECE_COLUMNS.join(", ")
    ))
    .bind(piece_id)
    .fetch_optional(conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    Ok(Some(PieceRecord {
        piece_id: row.try_get("piece_id")?,
        title: row.try_get("title")?,
        raw_instrument: row.try_get("raw_instrument")?,
        opus: row.try_get("opus")?,
        lyricist: row.try_get("lyricist")?,
        date_composed: row.try_get("date_composed")?,
        date_published: row.try_get("date_published")?,
        source: row.try_get("source")?,
        moreinfo: row.try_get("moreinfo")?,
        composer_id: row.try_get("composer_id")?,
        license_id: row.try_get("license_id")?,
        maintainer_id: row.try_get("maintainer_id")?,
        style_id: row.try_get("style_id")?,
        version_id: row.try_get("version_id")?,
    }))
}

/// Insert or update a piece so the catalog matches `record`
pub async fn reconcile(conn: &mut SqliteConnection, record: &PieceRecord) -> SyncResult<ReconcileOutcome> {
    if piece_exists(&mut *conn, &record.piece_id).await? {
        info!("Beginning UPDATE for piece {}", record.piece_id);
        update_piece(conn, record).await
    } else {
        info!("Beginning INSERT for piece {}", record.piece_id);
        insert_piece(conn, record).await?;
        Ok(ReconcileOutcome::Inserted)
    }
}

async fn insert_piece(conn: &mut SqliteConnection, record: &PieceRecord) -> SyncResult<()> {
    let sql = format!(
        "INSERT INTO mutopia_piece ({}) VALUES ({})",
        PIECE_COLUMNS.join(", "),
        vec!["?"; PIECE_COLUMNS.len()].join(", ")
    );

    let columns = record.columns();
    let query = columns
        .iter()
        .fold(sqlx::query(&sql), |query, (_, value)| value.bind_to(query));
    query.execute(conn).await?;

    Ok(())
}

async fn update_piece(conn: &mut SqliteConnection, record: &PieceRecord) -> SyncResult<ReconcileOutcome> {
    let Some(stored) = load_piece(&mut *conn, &record.piece_id).await? else {
        warn!("  No result for piece {}", record.piece_id);
        return Ok(ReconcileOutcome::Vanished);
    };

    let changes = record.changed_columns(&stored);
    if changes.is_empty() {
        return Ok(ReconcileOutcome::Unchanged);
    }

    let mut updated = Vec::with_capacity(changes.len());
    for (column, old, new) in changes {
        info!("  {}: {} -> {}", column, old, new);
        // Column names come from PIECE_COLUMNS, never from input
        let sql = format!("UPDATE mutopia_piece SET {} = ? WHERE piece_id = ?", column);
        new.bind_to(sqlx::query(&sql))
            .bind(&record.piece_id)
            .execute(&mut *conn)
            .await?;
        updated.push(column);
    }

    Ok(ReconcileOutcome::Updated(updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_connection;

    async fn seed_references(conn: &mut SqliteConnection) {
        sqlx::query("INSERT INTO mutopia_contributor (id, name) VALUES (1, 'Jane'), (2, 'John')")
            .execute(&mut *conn)
            .await
            .unwrap();
        sqlx::query("INSERT INTO mutopia_license (id, name) VALUES (1, 'Public Domain')")
            .execute(&mut *conn)
            .await
            .unwrap();
        sqlx::query("INSERT INTO mutopia_lpversion (id, version) VALUES (1, '2.18.2')")
            .execute(&mut *conn)
            .await
            .unwrap();
    }

    fn sample_record() -> PieceRecord {
        PieceRecord {
            piece_id: "1".to_string(),
            title: "Old".to_string(),
            raw_instrument: "Piano".to_string(),
            opus: "K. 545".to_string(),
            lyricist: String::new(),
            date_composed: "1788".to_string(),
            date_published: NaiveDate::from_ymd_opt(2016, 11, 9).unwrap(),
            source: "Breitkopf".to_string(),
            moreinfo: String::new(),
            composer_id: "MozartWA".to_string(),
            license_id: Some(1),
            maintainer_id: 1,
            style_id: "Classical".to_string(),
            version_id: Some(1),
        }
    }

    #[tokio::test]
    async fn test_insert_new_piece() {
        let mut conn = test_connection().await;
        seed_references(&mut conn).await;
        let record = sample_record();

        let outcome = reconcile(&mut conn, &record).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Inserted);

        assert!(piece_exists(&mut conn, "1").await.unwrap());
        let stored = load_piece(&mut conn, "1").await.unwrap().unwrap();
        assert_eq!(stored, record);
    }

    #[tokio::test]
    async fn test_identical_record_writes_nothing() {
        let mut conn = test_connection().await;
        seed_references(&mut conn).await;
        let record = sample_record();
        reconcile(&mut conn, &record).await.unwrap();

        let outcome = reconcile(&mut conn, &record).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_single_changed_field_single_update() {
        let mut conn = test_connection().await;
        seed_references(&mut conn).await;
        reconcile(&mut conn, &sample_record()).await.unwrap();

        let incoming = PieceRecord {
            title: "New".to_string(),
            ..sample_record()
        };
        let outcome = reconcile(&mut conn, &incoming).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Updated(vec!["title"]));

        let stored = load_piece(&mut conn, "1").await.unwrap().unwrap();
        assert_eq!(stored.title, "New");
    }

    #[tokio::test]
    async fn test_k_changed_fields_k_updates() {
        let mut conn = test_connection().await;
        seed_references(&mut conn).await;
        reconcile(&mut conn, &sample_record()).await.unwrap();

        let incoming = PieceRecord {
            opus: "K. 545a".to_string(),
            date_published: NaiveDate::from_ymd_opt(2017, 1, 2).unwrap(),
            license_id: None,
            maintainer_id: 2,
            ..sample_record()
        };
        let outcome = reconcile(&mut conn, &incoming).await.unwrap();
        assert_eq!(
            outcome,
            ReconcileOutcome::Updated(vec!["opus", "date_published", "license_id", "maintainer_id"])
        );

        let stored = load_piece(&mut conn, "1").await.unwrap().unwrap();
        assert_eq!(stored, incoming);
    }

    #[test]
    fn test_changed_columns_typed_comparison() {
        let stored = sample_record();
        let incoming = PieceRecord {
            version_id: None,
            ..sample_record()
        };

        let changes = incoming.changed_columns(&stored);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].0, "version_id");
        assert_eq!(changes[0].1, ColumnValue::OptionalId(Some(1)));
        assert_eq!(changes[0].2, ColumnValue::OptionalId(None));
    }

    #[test]
    fn test_from_document_normalizes_absent_text() {
        let doc = MetadataDocument {
            title: Some("Aria".to_string()),
            ..Default::default()
        };
        let id = MutopiaId {
            published: NaiveDate::from_ymd_opt(2016, 11, 9).unwrap(),
            piece_id: "7".to_string(),
        };

        let record = PieceRecord::from_document(&doc, id, None, 3, None);
        assert_eq!(record.piece_id, "7");
        assert_eq!(record.title, "Aria");
        assert_eq!(record.lyricist, "");
        assert_eq!(record.composer_id, "");
        assert_eq!(record.maintainer_id, 3);
    }

    #[tokio::test]
    async fn test_load_piece_reads_schema_defaults_as_empty_text() {
        let mut conn = test_connection().await;
        seed_references(&mut conn).await;
        sqlx::query(
            "INSERT INTO mutopia_piece (piece_id, date_published, maintainer_id) VALUES ('9', '2016-11-09', 2)",
        )
        .execute(&mut conn)
        .await
        .unwrap();

        let stored = load_piece(&mut conn, "9").await.unwrap().unwrap();

        assert_eq!(stored.title, "");
        assert_eq!(stored.moreinfo, "");
        assert_eq!(stored.license_id, None);
        assert_eq!(stored.version_id, None);
        assert_eq!(stored.maintainer_id, 2);
        assert_eq!(load_piece(&mut conn, "10").await.unwrap(), None);
    }
}
