//! Immutable in-memory index of template metadata.

use indexmap::IndexMap;
use n8n_mcp_types::TemplateMetadata;
use tracing::{info, warn};

use crate::store::TemplateStore;

/// Snapshot of every template known at startup.
///
/// Built once and shared by reference afterwards; there is no incremental update. Iteration
/// follows the order of the metadata file, which is also the tie-break order for ranking.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: IndexMap<String, TemplateMetadata>,
}

impl TemplateCatalog {
    /// Load the catalog from a store.
    ///
    /// Fails soft: any read or parse error yields an empty catalog so that resolution degrades
    /// to "no match" instead of taking the process down.
    pub async fn load(store: &dyn TemplateStore) -> Self {
        match store.read_metadata().await {
            Ok(records) => {
                let catalog = Self::from_records(records);
                info!(templates = catalog.len(), "template catalog loaded");
                catalog
            }
            Err(error) => {
                warn!(%error, "failed to load template metadata; continuing with an empty catalog");
                Self::default()
            }
        }
    }

    /// Build a catalog from records, keeping the first occurrence of a duplicated id.
    pub fn from_records(records: impl IntoIterator<Item = TemplateMetadata>) -> Self {
        let mut templates = IndexMap::new();
        for record in records {
            if templates.contains_key(&record.id) {
                warn!(id = %record.id, "duplicate template id ignored");
                continue;
            }
            templates.insert(record.id.clone(), record);
        }
        Self { templates }
    }

    /// Exact-match lookup by template id.
    pub fn find_by_id(&self, id: &str) -> Option<&TemplateMetadata> {
        self.templates.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TemplateMetadata> {
        self.templates.values()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Distinct non-empty categories in catalog order.
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = Vec::new();
        for template in self.iter() {
            let category = template.category.as_str();
            if !category.is_empty() && !categories.contains(&category) {
                categories.push(category);
            }
        }
        categories
    }
}
