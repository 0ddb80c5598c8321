//! Instrument mapping
//!
//! Pieces describe their instrumentation as free text ("Piano, Violin &
//! Cello", "Voice (SATB) and organ"). The mapper turns that text into rows of
//! `mutopia_piece_instruments`, either by a direct hit on the canonical
//! instrument list or through the alias table.

use crate::error::SyncResult;
use once_cell::sync::Lazy;
use regex::Regex;
use sqlx::SqliteConnection;
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Tokens shorter than this never match ("&", "or", "in", ...)
pub const MIN_TOKEN_CHARS: usize = 3;

static NON_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\W+").expect("separator pattern is a valid regex"));

/// Summary of one backfill pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstrumentBackfill {
    /// Pieces that had no mapping when the pass started
    pub examined: usize,
    /// Pieces that received at least one mapping
    pub mapped: usize,
    pub rows_inserted: u64,
    /// Pieces with no resolvable token; retried on the next pass
    pub unmatched: Vec<String>,
}

/// Split free text into candidate instrument tokens
pub fn tokenize(raw: &str) -> Vec<&str> {
    NON_WORD
        .split(raw)
        .map(str::trim)
        .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
        .collect()
}

/// First character upper case, the rest lower case ("vIOLIN" -> "Violin")
pub fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Map one token to a canonical instrument
///
/// Canonical names are tried first, then the lowercase alias table.
pub async fn translate(conn: &mut SqliteConnection, token: &str) -> SyncResult<Option<String>> {
    if token.chars().count() < MIN_TOKEN_CHARS {
        return Ok(None);
    }

    let canonical: Option<String> =
        sqlx::query_scalar("SELECT instrument FROM mutopia_instrument WHERE instrument = ?")
            .bind(capitalize(token))
            .fetch_optional(&mut *conn)
            .await?;
    if canonical.is_some() {
        return Ok(canonical);
    }

    let aliased: Option<String> =
        sqlx::query_scalar("SELECT instrument_id FROM update_instrumentmap WHERE raw_instrument = ?")
            .bind(token.to_lowercase())
            .fetch_optional(&mut *conn)
            .await?;

    Ok(aliased)
}

/// Map instruments for every piece that has none yet
pub async fn update(conn: &mut SqliteConnection) -> SyncResult<InstrumentBackfill> {
    let pieces: Vec<(String, String)> = sqlx::query_as(
        r#"
        SELECT piece_id, raw_instrument
        FROM mutopia_piece
        WHERE piece_id NOT IN (SELECT piece_id FROM mutopia_piece_instruments)
        ORDER BY piece_id
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    let mut report = InstrumentBackfill {
        examined: pieces.len(),
        ..Default::default()
    };

    for (piece_id, raw_instrument) in pieces {
        // Set: a repeated token yields one mapping row
        let mut matched = BTreeSet::new();
        for token in tokenize(&raw_instrument) {
            if let Some(instrument) = translate(&mut *conn, token).await? {
                matched.insert(instrument);
            }
        }

        if matched.is_empty() {
            warn!("No instruments match for piece {} (\"{}\")", piece_id, raw_instrument);
            report.unmatched.push(piece_id);
            continue;
        }

        info!("For raw instrument \"{}\"", raw_instrument);
        for instrument in &matched {
            info!("   {}", instrument);
            report.rows_inserted += sqlx::query(
                "INSERT OR IGNORE INTO mutopia_piece_instruments (piece_id, instrument_id) VALUES (?, ?)",
            )
            .bind(&piece_id)
            .bind(instrument)
            .execute(&mut *conn)
            .await?
            .rows_affected();
        }
        report.mapped += 1;
    }

    Ok(report)
}
