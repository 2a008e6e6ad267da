//! Candidate document model.

use serde::{Deserialize, Serialize};

/// Dense embedding vector. Dimensionality is fixed per provider.
pub type Embedding = Vec<f32>;

/// Candidate document produced by a [`crate::CandidateSource`].
///
/// Never mutated by the pipeline.
///
/// # Example
/// ```rust
/// use triage::Document;
///
/// let doc = Document::new("pmid:1", "Title", "Abstract text");
/// assert_eq!(doc.embedding_text(), "Title\n\nAbstract text");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Source-scoped identifier (DOI, PMID, ...).
    pub id: String,
    pub title: String,
    #[serde(default, rename = "abstract")]
    pub abstract_text: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub url: Option<String>,
    /// Which literature database produced this record.
    #[serde(default)]
    pub source_tag: String,
}

impl Document {
    /// Creates a document with only the fields used for scoring.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        abstract_text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            abstract_text: abstract_text.into(),
            authors: Vec::new(),
            year: None,
            url: None,
            source_tag: String::new(),
        }
    }

    pub fn with_source_tag(mut self, tag: impl Into<String>) -> Self {
        self.source_tag = tag.into();
        self
    }

    /// Text sent to the embedding provider: title and abstract.
    pub fn embedding_text(&self) -> String {
        let title = self.title.trim();
        let abstract_text = self.abstract_text.trim();
        match (title.is_empty(), abstract_text.is_empty()) {
            (false, false) => format!("{}\n\n{}", title, abstract_text),
            (false, true) => title.to_string(),
            (true, false) => abstract_text.to_string(),
            (true, true) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_text_skips_empty_parts() {
        assert_eq!(Document::new("a", "T", "").embedding_text(), "T");
        assert_eq!(Document::new("a", "  ", "Abs").embedding_text(), "Abs");
        assert_eq!(Document::new("a", "", "").embedding_text(), "");
    }

    #[test]
    fn test_document_deserializes_abstract_field() {
        let json = r#"{"id":"doi:1","title":"T","abstract":"A","year":2021}"#;
        let doc: Document = serde_json::from_str(json).expect("valid document json");

        assert_eq!(doc.abstract_text, "A");
        assert_eq!(doc.year, Some(2021));
        assert!(doc.authors.is_empty());
        assert!(doc.source_tag.is_empty());
    }
}
