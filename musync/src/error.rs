//! Error types for musync
//!
//! Errors split into two classes. Entry-scoped errors describe a problem with
//! one harvested entry: the orchestrator logs them, records the entry as
//! skipped, and moves on. Everything else aborts the run and rolls back all of
//! its work.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// Identifier missing, mal-formed, or naming an impossible date
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Metadata document does not exist at its archive location
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Transport failure or unexpected HTTP status while fetching a document
    #[error("Fetch failed for {location}: {reason}")]
    Fetch { location: String, reason: String },

    /// Document fetched but unreadable
    #[error("Invalid document {location}: {reason}")]
    InvalidDocument { location: String, reason: String },

    /// Maintainer could not be resolved to a contributor row
    #[error("Could not resolve maintainer for piece {0}")]
    MaintainerResolution(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Common(#[from] musync_common::Error),
}

impl SyncError {
    /// True when the error only concerns the entry being processed
    pub fn is_entry_scoped(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidIdentifier(_)
                | SyncError::NotFound(_)
                | SyncError::Fetch { .. }
                | SyncError::InvalidDocument { .. }
                | SyncError::MaintainerResolution(_)
        )
    }
}

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;
