//! Metadata document retrieval
//!
//! An entry's document lives at `{archive_base}/{folder}/{name}.rdf`. The
//! archive base is either the published HTTP archive or a local mirror
//! directory (plain path or `file://` URL).

use crate::document::MetadataDocument;
use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use musync_common::SyncConfig;
use reqwest::StatusCode;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Extension of the per-piece metadata document
pub const DOCUMENT_EXTENSION: &str = "rdf";

/// Source of metadata documents for harvested entries
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetch and decode the document for the entry stored under `folder/name`
    async fn fetch(&self, folder: &str, name: &str) -> SyncResult<MetadataDocument>;
}

#[async_trait]
impl<T: DocumentSource + ?Sized> DocumentSource for Arc<T> {
    async fn fetch(&self, folder: &str, name: &str) -> SyncResult<MetadataDocument> {
        (**self).fetch(folder, name).await
    }
}

#[derive(Debug, Clone)]
enum ArchiveBase {
    Remote(String),
    Local(PathBuf),
}

/// Fetches documents from the archive named in the configuration
pub struct ArchiveClient {
    base: ArchiveBase,
    client: reqwest::Client,
}

impl ArchiveClient {
    pub fn new(archive_base: &str, timeout: Duration) -> SyncResult<Self> {
        let trimmed = archive_base.trim_end_matches('/');
        let base = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            ArchiveBase::Remote(trimmed.to_string())
        } else {
            let path = trimmed.strip_prefix("file://").unwrap_or(trimmed);
            ArchiveBase::Local(PathBuf::from(path))
        };

        let client = reqwest::Client::builder()
            .user_agent(concat!("musync/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| {
                musync_common::Error::Config(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self { base, client })
    }

    pub fn from_config(config: &SyncConfig) -> SyncResult<Self> {
        Self::new(&config.archive_base, config.fetch_timeout)
    }

    /// Location of an entry's document, as a URL or filesystem path
    pub fn document_location(&self, folder: &str, name: &str) -> String {
        let relative = format!(
            "{}/{}.{}",
            folder.trim_matches('/'),
            name,
            DOCUMENT_EXTENSION
        );
        match &self.base {
            ArchiveBase::Remote(url) => format!("{}/{}", url, relative),
            ArchiveBase::Local(dir) => dir.join(relative).display().to_string(),
        }
    }

    async fn read_remote(&self, location: &str) -> SyncResult<String> {
        let fetch_error = |reason: String| SyncError::Fetch {
            location: location.to_string(),
            reason,
        };

        let response = self
            .client
            .get(location)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::GONE => {
                Err(SyncError::NotFound(location.to_string()))
            }
            status if !status.is_success() => Err(fetch_error(format!("HTTP {}", status))),
            _ => response.text().await.map_err(|e| fetch_error(e.to_string())),
        }
    }

    async fn read_local(&self, location: &str) -> SyncResult<String> {
        match tokio::fs::read_to_string(location).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(SyncError::NotFound(location.to_string()))
            }
            Err(e) => Err(SyncError::Fetch {
                location: location.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

#[async_trait]
impl DocumentSource for ArchiveClient {
    async fn fetch(&self, folder: &str, name: &str) -> SyncResult<MetadataDocument> {
        let location = self.document_location(folder, name);
        debug!("Reading {}", location);

        let content = match &self.base {
            ArchiveBase::Remote(_) => self.read_remote(&location).await?,
            ArchiveBase::Local(_) => self.read_local(&location).await?,
        };

        MetadataDocument::from_rdf(&content, &location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn client(base: &str) -> ArchiveClient {
        ArchiveClient::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_remote_document_location() {
        let client = client("http://www.mutopiaproject.org/ftp/");
        assert_eq!(
            client.document_location("BachJS/BWV988/bwv988-aria", "bwv988-aria"),
            "http://www.mutopiaproject.org/ftp/BachJS/BWV988/bwv988-aria/bwv988-aria.rdf"
        );
    }

    #[test]
    fn test_local_document_location() {
        let client = client("file:///srv/mutopia/ftp");
        assert_eq!(
            client.document_location("/SorF/O31/sor-op31-22/", "sor-op31-22"),
            "/srv/mutopia/ftp/SorF/O31/sor-op31-22/sor-op31-22.rdf"
        );
    }

    #[tokio::test]
    async fn test_local_fetch_reads_document() {
        let dir = TempDir::new().unwrap();
        let folder = dir.path().join("MozartWA").join("K545");
        std::fs::create_dir_all(&folder).unwrap();
        std::fs::write(
            folder.join("k545.rdf"),
            r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns:mp="http://www.mutopiaproject.org/piece-data/0.1/">
  <rdf:Description rdf:about="."><mp:id>Mutopia-2016/11/9-1</mp:id><mp:title>Sonata</mp:title></rdf:Description>
</rdf:RDF>"#,
        )
        .unwrap();

        let client = client(&dir.path().display().to_string());
        let doc = client.fetch("MozartWA/K545", "k545").await.unwrap();

        assert_eq!(doc.identifier.as_deref(), Some("Mutopia-2016/11/9-1"));
        assert_eq!(doc.title.as_deref(), Some("Sonata"));
    }

    #[tokio::test]
    async fn test_local_fetch_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let client = client(&dir.path().display().to_string());

        let result = client.fetch("Nobody/Nothing", "nothing").await;
        assert!(matches!(result, Err(SyncError::NotFound(_))));
    }
}
