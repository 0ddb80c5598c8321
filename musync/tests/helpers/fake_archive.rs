//! In-memory document source
//!
//! Documents are keyed by `folder/name`, the same pair the backlog stores.

use async_trait::async_trait;
use musync::document::MetadataDocument;
use musync::{DocumentSource, SyncError, SyncResult};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub enum FakeDocument {
    Rdf(String),
    /// Archive answers 404
    Missing,
    /// Transport failure
    Unreachable,
}

#[derive(Default)]
pub struct FakeArchive {
    documents: Mutex<HashMap<String, FakeDocument>>,
    requests: Mutex<Vec<String>>,
}

impl FakeArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, folder: &str, name: &str, document: FakeDocument) -> Self {
        self.set(folder, name, document);
        self
    }

    pub fn set(&self, folder: &str, name: &str, document: FakeDocument) {
        self.documents
            .lock()
            .unwrap()
            .insert(format!("{}/{}", folder, name), document);
    }

    /// Every `folder/name` fetched so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentSource for FakeArchive {
    async fn fetch(&self, folder: &str, name: &str) -> SyncResult<MetadataDocument> {
        let key = format!("{}/{}", folder, name);
        self.requests.lock().unwrap().push(key.clone());

        let document = self.documents.lock().unwrap().get(&key).cloned();
        match document {
            Some(FakeDocument::Rdf(xml)) => MetadataDocument::from_rdf(&xml, &key),
            Some(FakeDocument::Unreachable) => Err(SyncError::Fetch {
                location: key,
                reason: "connection refused".to_string(),
            }),
            Some(FakeDocument::Missing) | None => Err(SyncError::NotFound(key)),
        }
    }
}

/// Minimal RDF document carrying the given `mp:` properties
pub fn rdf(properties: &[(&str, &str)]) -> String {
    let body: String = properties
        .iter()
        .map(|(key, value)| format!("    <mp:{key}>{value}</mp:{key}>\n", key = key, value = value))
        .collect();

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\" \
         xmlns:mp=\"http://www.mutopiaproject.org/piece-data/0.1/\">\n\
         <rdf:Description rdf:about=\".\">\n{}</rdf:Description>\n</rdf:RDF>\n",
        body
    )
}

/// A complete, publishable document for `piece_id`
pub fn piece_rdf(piece_id: &str, title: &str, instrumentation: &str) -> String {
    let identifier = format!("Mutopia-2016/11/09-{}", piece_id);
    rdf(&[
        ("id", identifier.as_str()),
        ("title", title),
        ("for", instrumentation),
        ("composer", "MozartWA"),
        ("style", "Classical"),
        ("licence", "Public Domain"),
        ("maintainer", "Jane Engraver"),
        ("maintainerEmail", "jane@example.org"),
        ("lilypondVersion", "2.18.2"),
    ])
}
