use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::CandidateSource;
use super::error::{SourceError, SourceResult};
use crate::document::Document;

/// Serves a JSON array of documents from disk, paginated in memory.
///
/// Every query sees the same candidate list; relevance is left to scoring.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
    documents: Vec<Document>,
}

impl JsonFileSource {
    /// Loads and parses `path` eagerly.
    pub fn open(path: impl AsRef<Path>) -> SourceResult<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| SourceError::Read {
            path: display.clone(),
            source,
        })?;
        let documents: Vec<Document> =
            serde_json::from_str(&raw).map_err(|source| SourceError::Parse {
                path: display,
                source,
            })?;

        debug!(path = %path.display(), documents = documents.len(), "Loaded candidate file");
        Ok(Self {
            path: path.to_path_buf(),
            documents,
        })
    }

    pub fn from_documents(documents: Vec<Document>) -> Self {
        Self {
            path: PathBuf::new(),
            documents,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl CandidateSource for JsonFileSource {
    async fn fetch_page(
        &self,
        _query: &str,
        offset: usize,
        limit: usize,
    ) -> SourceResult<Vec<Document>> {
        Ok(self
            .documents
            .iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}
