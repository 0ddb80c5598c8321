//! Database models

/// Harvested entry awaiting reconciliation (`mutopia_assetmap` row)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEntry {
    pub entry_id: i64,
    /// Archive folder holding the entry's files, relative to the archive base
    pub folder: String,
    /// File stem shared by the entry's .ly, .rdf and rendered outputs
    pub name: String,
    pub has_lys: bool,
    /// Unset until the entry has been published
    pub piece_id: Option<String>,
}

/// Maintainer of one or more pieces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contributor {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LilypondVersion {
    pub id: i64,
    pub version: String,
    pub major: String,
    pub minor: String,
    pub edit: String,
}
