//! Lazy resolution of a template's document reference.

use std::sync::Arc;

use n8n_mcp_types::{TemplateMetadata, WorkflowDocument};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::store::TemplateStore;

/// A template whose document was read but not interpreted.
#[derive(Debug, Clone)]
pub struct StoredTemplate {
    pub metadata: TemplateMetadata,
    /// Document exactly as stored, echoed back by the get-template capability.
    pub raw: Value,
}

/// A template whose document was read and parsed.
#[derive(Debug, Clone)]
pub struct LoadedTemplate {
    pub metadata: TemplateMetadata,
    pub raw: Value,
    pub document: WorkflowDocument,
}

/// The metadata resolved but its document could not be read or parsed.
#[derive(Debug, Clone, Error)]
#[error("failed to load template '{}' from '{}': {reason}", .metadata.id, .metadata.document_ref)]
pub struct LoadError {
    /// Echoed for diagnostics.
    pub metadata: TemplateMetadata,
    pub reason: String,
}

impl LoadError {
    fn new(metadata: &TemplateMetadata, reason: String) -> Self {
        warn!(id = %metadata.id, reference = %metadata.document_ref, %reason, "template document unavailable");
        Self {
            metadata: metadata.clone(),
            reason,
        }
    }
}

/// Resolves `document_ref` through a [`TemplateStore`].
#[derive(Clone)]
pub struct DocumentLoader {
    store: Arc<dyn TemplateStore>,
}

impl DocumentLoader {
    pub fn new(store: Arc<dyn TemplateStore>) -> Self {
        Self { store }
    }

    /// Read the stored JSON object without interpreting its workflow structure.
    pub async fn read(&self, metadata: &TemplateMetadata) -> Result<StoredTemplate, LoadError> {
        let raw = self
            .store
            .read_document(&metadata.document_ref)
            .await
            .map_err(|error| LoadError::new(metadata, error.to_string()))?;
        if !raw.is_object() {
            return Err(LoadError::new(metadata, "template document must be a JSON object".to_string()));
        }
        Ok(StoredTemplate {
            metadata: metadata.clone(),
            raw,
        })
    }

    /// Read the document and parse it into a [`WorkflowDocument`] ready for instantiation.
    pub async fn load(&self, metadata: &TemplateMetadata) -> Result<LoadedTemplate, LoadError> {
        let StoredTemplate { metadata, raw } = self.read(metadata).await?;
        let document = WorkflowDocument::from_value(raw.clone()).map_err(|error| LoadError::new(&metadata, error.to_string()))?;

        Ok(LoadedTemplate { metadata, raw, document })
    }
}

impl std::fmt::Debug for DocumentLoader {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("DocumentLoader").finish_non_exhaustive()
    }
}
