//! musync - synchronize published sheet music with the catalog database
//!
//! Harvested entries (`mutopia_assetmap` rows without a piece id) are turned
//! into catalog pieces: each entry's RDF metadata document is fetched from the
//! archive, its identifier parsed, its license/maintainer/version references
//! resolved, and the piece row inserted or minimally updated. After the batch,
//! instrument mappings are backfilled and the search view is rebuilt.
//!
//! Exposes public APIs for integration testing.

pub mod db;
pub mod document;
pub mod error;
pub mod fetch;
pub mod identifier;
pub mod instruments;
pub mod logging;
pub mod publish;

pub use crate::error::{SyncError, SyncResult};
pub use crate::fetch::{ArchiveClient, DocumentSource};
pub use crate::publish::{EntryOutcome, PublishReport, Publisher};
