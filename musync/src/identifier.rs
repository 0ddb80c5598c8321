//! Mutopia identifier parsing
//!
//! Every published piece carries an identifier of the form
//! `Mutopia-YYYY/M/D-N`, e.g. `Mutopia-2016/11/9-1`. The date is the
//! publication date and `N` is the piece id used as the catalog's natural key.

use crate::error::{SyncError, SyncResult};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// Anchored at the end: nothing may follow the numeric piece id.
static IDENTIFIER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Mutopia-([0-9]{4})/([0-9]{1,2})/([0-9]{1,2})-([0-9]+)$")
        .expect("identifier pattern is a valid regex")
});

/// Publication date and piece id extracted from an identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutopiaId {
    pub published: NaiveDate,
    pub piece_id: String,
}

/// Parse a Mutopia identifier
///
/// Fails with [`SyncError::InvalidIdentifier`] when the identifier is absent
/// or empty, does not match the expected shape, or names a date that does not
/// exist (month 13, February 30, ...).
pub fn parse_identifier(raw: Option<&str>) -> SyncResult<MutopiaId> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SyncError::InvalidIdentifier("empty identifier".to_string()))?;

    let caps = IDENTIFIER_PATTERN
        .captures(raw)
        .ok_or_else(|| SyncError::InvalidIdentifier(format!("mal-formed identifier '{}'", raw)))?;

    // The groups are bounded-length digit runs, so the numeric parses cannot
    // overflow; only the calendar check can fail.
    let year: i32 = caps[1].parse().unwrap_or_default();
    let month: u32 = caps[2].parse().unwrap_or_default();
    let day: u32 = caps[3].parse().unwrap_or_default();

    // Year 0 is not a calendar year, though chrono accepts it
    let published = Some(year)
        .filter(|y| *y >= 1)
        .and_then(|y| NaiveDate::from_ymd_opt(y, month, day))
        .ok_or_else(|| SyncError::InvalidIdentifier(format!("invalid date in identifier '{}'", raw)))?;

    Ok(MutopiaId {
        published,
        piece_id: caps[4].to_string(),
    })
}
