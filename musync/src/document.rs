//! Typed metadata documents
//!
//! Each published piece ships an RDF/XML description alongside its sources.
//! Only the flat piece-data properties of the `rdf:Description` are
//! meaningful here. Properties are matched by namespace, whatever prefix the
//! document binds to it.

use crate::error::{SyncError, SyncResult};
use roxmltree::{Document, Node};

/// Namespace of the piece-data vocabulary
pub const PIECE_DATA_NS: &str = "http://www.mutopiaproject.org/piece-data/0.1/";

/// Fixed vocabulary of a piece metadata document. Absent or empty elements
/// are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataDocument {
    pub identifier: Option<String>,
    pub title: Option<String>,
    pub instrumentation: Option<String>,
    pub opus: Option<String>,
    pub lyricist: Option<String>,
    pub composition_date: Option<String>,
    pub source: Option<String>,
    pub moreinfo: Option<String>,
    pub composer: Option<String>,
    pub license: Option<String>,
    pub maintainer: Option<String>,
    pub maintainer_email: Option<String>,
    pub maintainer_website: Option<String>,
    pub style: Option<String>,
    pub notation_version: Option<String>,
}

impl MetadataDocument {
    /// Extract the vocabulary from an RDF/XML document
    ///
    /// `location` is only used for error messages. Malformed XML and a
    /// document without any piece-data property are rejected; unknown
    /// properties are ignored.
    pub fn from_rdf(xml: &str, location: &str) -> SyncResult<Self> {
        let invalid = |reason: String| SyncError::InvalidDocument {
            location: location.to_string(),
            reason,
        };

        let tree = Document::parse(xml).map_err(|e| invalid(e.to_string()))?;

        let mut doc = MetadataDocument::default();
        let mut properties = 0usize;

        for node in tree
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().namespace() == Some(PIECE_DATA_NS))
        {
            properties += 1;
            if let Some(slot) = doc.slot_mut(node.tag_name().name()) {
                *slot = element_text(node);
            }
        }

        if properties == 0 {
            return Err(invalid("no piece properties found".to_string()));
        }

        Ok(doc)
    }

    /// Field for an RDF property name
    fn slot_mut(&mut self, key: &str) -> Option<&mut Option<String>> {
        let slot = match key {
            "id" => &mut self.identifier,
            "title" => &mut self.title,
            "for" => &mut self.instrumentation,
            "opus" => &mut self.opus,
            "lyricist" => &mut self.lyricist,
            "date" => &mut self.composition_date,
            "source" => &mut self.source,
            "moreInfo" | "moreinfo" => &mut self.moreinfo,
            "composer" => &mut self.composer,
            "licence" | "license" => &mut self.license,
            "maintainer" => &mut self.maintainer,
            "maintainerEmail" => &mut self.maintainer_email,
            "maintainerWeb" => &mut self.maintainer_website,
            "style" => &mut self.style,
            "lilypondVersion" => &mut self.notation_version,
            _ => return None,
        };
        Some(slot)
    }
}

/// Trimmed character data of an element (text and CDATA, never comments)
fn element_text(node: Node<'_, '_>) -> Option<String> {
    let text: String = node
        .descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect();

    Some(text.trim().to_string()).filter(|t| !t.is_empty())
}
