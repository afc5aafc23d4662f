//! Template store adapters.
//!
//! A store is a read-only collection of template metadata records plus the workflow documents
//! they reference. The filesystem layout is:
//!
//! ```text
//! <root>/templates-metadata.json   {"templates": [ ... ]}
//! <root>/<documentRef>             one JSON workflow document per template
//! ```

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use n8n_mcp_types::TemplateMetadata;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// File holding the catalog metadata inside a store root.
pub const METADATA_FILE_NAME: &str = "templates-metadata.json";

/// Errors raised while reading from a template store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse '{reference}': {source}")]
    Parse {
        reference: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("document reference '{reference}' must be a relative path inside the template directory")]
    InvalidReference { reference: String },
    #[error("document '{reference}' not found")]
    Missing { reference: String },
}

/// Serialized shape of the metadata file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub templates: Vec<TemplateMetadata>,
}

/// Read-only source of template metadata and documents.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Read every metadata record, in file order.
    async fn read_metadata(&self) -> Result<Vec<TemplateMetadata>, StoreError>;

    /// Read and parse the document addressed by `reference`.
    async fn read_document(&self, reference: &str) -> Result<Value, StoreError>;
}

/// Filesystem-backed store rooted at a template directory.
#[derive(Debug, Clone)]
pub struct FsTemplateStore {
    root: PathBuf,
}

impl FsTemplateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, reference: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(reference);
        let stays_inside = !reference.trim().is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        if !stays_inside {
            return Err(StoreError::InvalidReference {
                reference: reference.to_string(),
            });
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl TemplateStore for FsTemplateStore {
    async fn read_metadata(&self) -> Result<Vec<TemplateMetadata>, StoreError> {
        let path = self.root.join(METADATA_FILE_NAME);
        debug!(path = %path.display(), "reading template metadata");
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| StoreError::Io { path, source })?;
        let file: CatalogFile = serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            reference: METADATA_FILE_NAME.to_string(),
            source,
        })?;
        Ok(file.templates)
    }

    async fn read_document(&self, reference: &str) -> Result<Value, StoreError> {
        let path = self.document_path(reference)?;
        debug!(path = %path.display(), "reading template document");
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| StoreError::Io { path, source })?;
        serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            reference: reference.to_string(),
            source,
        })
    }
}

/// In-memory store, mostly useful for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryTemplateStore {
    metadata: Vec<TemplateMetadata>,
    documents: HashMap<String, Value>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template together with its document.
    pub fn with_template(mut self, metadata: TemplateMetadata, document: Value) -> Self {
        self.documents.insert(metadata.document_ref.clone(), document);
        self.metadata.push(metadata);
        self
    }

    /// Register metadata whose document reference does not resolve.
    pub fn with_dangling_template(mut self, metadata: TemplateMetadata) -> Self {
        self.metadata.push(metadata);
        self
    }
}

#[async_trait]
impl TemplateStore for MemoryTemplateStore {
    async fn read_metadata(&self) -> Result<Vec<TemplateMetadata>, StoreError> {
        Ok(self.metadata.clone())
    }

    async fn read_document(&self, reference: &str) -> Result<Value, StoreError> {
        self.documents.get(reference).cloned().ok_or_else(|| StoreError::Missing {
            reference: reference.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn write_fixture(root: &Path) {
        let metadata = json!({
            "templates": [{
                "id": "slack-notifier",
                "file": "slack-notifier.json",
                "name": "Slack Notifier",
                "keywords": ["slack"]
            }]
        });
        fs::write(root.join(METADATA_FILE_NAME), metadata.to_string()).expect("write metadata");
        fs::write(root.join("slack-notifier.json"), json!({ "name": "Slack", "nodes": [] }).to_string()).expect("write document");
    }

    #[tokio::test]
    async fn reads_metadata_and_documents_from_directory() {
        let directory = tempdir().expect("tempdir");
        write_fixture(directory.path());
        let store = FsTemplateStore::new(directory.path());

        let metadata = store.read_metadata().await.expect("metadata loads");
        assert_eq!(metadata.len(), 1);
        assert_eq!(metadata[0].id, "slack-notifier");

        let document = store.read_document("slack-notifier.json").await.expect("document loads");
        assert_eq!(document["name"], "Slack");
    }

    #[tokio::test]
    async fn missing_metadata_file_is_an_io_error() {
        let directory = tempdir().expect("tempdir");
        let store = FsTemplateStore::new(directory.path());

        assert!(matches!(store.read_metadata().await, Err(StoreError::Io { .. })));
    }

    #[tokio::test]
    async fn malformed_document_is_a_parse_error() {
        let directory = tempdir().expect("tempdir");
        fs::write(directory.path().join("broken.json"), "{ not json").expect("write document");
        let store = FsTemplateStore::new(directory.path());

        let error = store.read_document("broken.json").await.expect_err("parse fails");
        assert!(matches!(error, StoreError::Parse { ref reference, .. } if reference == "broken.json"));
    }

    #[tokio::test]
    async fn rejects_references_escaping_the_root() {
        let directory = tempdir().expect("tempdir");
        let store = FsTemplateStore::new(directory.path());

        for reference in ["../secrets.json", "/etc/passwd", ""] {
            let error = store.read_document(reference).await.expect_err("reference rejected");
            assert!(matches!(error, StoreError::InvalidReference { .. }), "{reference}: {error}");
        }
    }

    #[tokio::test]
    async fn memory_store_reports_dangling_references() {
        let metadata: TemplateMetadata =
            serde_json::from_value(json!({ "id": "t1", "file": "gone.json", "name": "T1" })).expect("metadata");
        let store = MemoryTemplateStore::new().with_dangling_template(metadata);

        assert_eq!(store.read_metadata().await.expect("metadata").len(), 1);
        assert!(matches!(
            store.read_document("gone.json").await,
            Err(StoreError::Missing { .. })
        ));
    }
}
