//! Publish orchestration
//!
//! One run drives a batch of pending entries into the catalog:
//!
//! 1. Open the run transaction and record the run (takes the write lock)
//! 2. For each entry, inside its own savepoint: fetch the document, parse the
//!    identifier, resolve license/maintainer/version, reconcile the piece
//! 3. Mark published entries, backfill instrument mappings, refresh the search
//!    view, close the run record
//! 4. Commit
//!
//! An entry-scoped failure rolls back that entry's savepoint only and the
//! batch continues. Any other failure drops the run transaction, which rolls
//! back everything the run did.

use crate::db::pieces::{PieceRecord, ReconcileOutcome};
use crate::db::{contributors, entries, licenses, pieces, runs, search_view, versions};
use crate::document::MetadataDocument;
use crate::error::{SyncError, SyncResult};
use crate::fetch::DocumentSource;
use crate::identifier::parse_identifier;
use crate::instruments::{self, InstrumentBackfill};
use musync_common::db::PendingEntry;
use sqlx::{Connection, SqliteConnection};
use tracing::{info, warn};

/// What happened to one entry during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    Published {
        entry_id: i64,
        piece_id: String,
        reconcile: ReconcileOutcome,
    },
    /// Entry stays in the backlog and is retried next run
    Skipped { entry_id: i64, reason: String },
}

impl EntryOutcome {
    pub fn entry_id(&self) -> i64 {
        match self {
            EntryOutcome::Published { entry_id, .. } | EntryOutcome::Skipped { entry_id, .. } => {
                *entry_id
            }
        }
    }
}

/// Result of a committed run
#[derive(Debug, Clone, Default)]
pub struct PublishReport {
    pub run_id: i64,
    pub outcomes: Vec<EntryOutcome>,
    pub instruments: InstrumentBackfill,
    pub search_rows: u64,
}

impl PublishReport {
    /// `(piece_id, entry_id)` for every published entry
    pub fn published(&self) -> Vec<(String, i64)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                EntryOutcome::Published {
                    entry_id, piece_id, ..
                } => Some((piece_id.clone(), *entry_id)),
                EntryOutcome::Skipped { .. } => None,
            })
            .collect()
    }

    pub fn skipped(&self) -> Vec<&EntryOutcome> {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome, EntryOutcome::Skipped { .. }))
            .collect()
    }
}

/// Drives pending entries through reconciliation
pub struct Publisher<S> {
    source: S,
}

impl<S: DocumentSource> Publisher<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Process up to `limit` pending entries (0 = all) in one transaction
    pub async fn run(&self, conn: &mut SqliteConnection, limit: u32) -> SyncResult<PublishReport> {
        let mut tx = conn.begin().await?;

        let run_id = runs::begin_run(&mut tx, limit).await?;
        let backlog = entries::load_backlog(&mut tx, limit).await?;
        info!("Run {}: {} pending entries", run_id, backlog.len());

        let mut report = PublishReport {
            run_id,
            ..Default::default()
        };

        for entry in &backlog {
            let mut savepoint = tx.begin().await?;
            match self.process_entry(&mut savepoint, entry).await {
                Ok((piece_id, reconcile)) => {
                    savepoint.commit().await?;
                    report.outcomes.push(EntryOutcome::Published {
                        entry_id: entry.entry_id,
                        piece_id,
                        reconcile,
                    });
                }
                Err(e) if e.is_entry_scoped() => {
                    savepoint.rollback().await?;
                    warn!("Skipping entry {} ({}/{}): {}", entry.entry_id, entry.folder, entry.name, e);
                    report.outcomes.push(EntryOutcome::Skipped {
                        entry_id: entry.entry_id,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        let published = report.published();
        entries::mark_published(&mut tx, &published).await?;
        for skipped in report.skipped() {
            info!("Rejecting update with id {}", skipped.entry_id());
        }

        report.instruments = instruments::update(&mut tx).await?;
        report.search_rows = search_view::refresh_search_view(&mut tx).await?;

        runs::finish_run(&mut tx, run_id, published.len(), report.skipped().len()).await?;
        tx.commit().await?;

        info!(
            "Run {} committed: {} published, {} skipped, {} instrument mappings added",
            run_id,
            published.len(),
            report.skipped().len(),
            report.instruments.rows_inserted
        );

        Ok(report)
    }

    async fn process_entry(
        &self,
        conn: &mut SqliteConnection,
        entry: &PendingEntry,
    ) -> SyncResult<(String, ReconcileOutcome)> {
        let doc = self.source.fetch(&entry.folder, &entry.name).await?;
        let record = resolve_record(conn, &doc).await?;
        let outcome = pieces::reconcile(conn, &record).await?;
        Ok((record.piece_id, outcome))
    }
}

/// Build the catalog record for a document, resolving its references
pub async fn resolve_record(conn: &mut SqliteConnection, doc: &MetadataDocument) -> SyncResult<PieceRecord> {
    let id = parse_identifier(doc.identifier.as_deref())?;

    let license_id = licenses::find_license(&mut *conn, doc.license.as_deref()).await?;

    let maintainer_id = contributors::resolve_contributor(
        &mut *conn,
        doc.maintainer.as_deref(),
        doc.maintainer_email.as_deref(),
        doc.maintainer_website.as_deref(),
    )
    .await?
    .ok_or_else(|| SyncError::MaintainerResolution(id.piece_id.clone()))?;

    let version_id = versions::resolve_version(&mut *conn, doc.notation_version.as_deref()).await?;

    Ok(PieceRecord::from_document(doc, id, license_id, maintainer_id, version_id))
}
