//! Catalog listing with category and search filters.

use n8n_mcp_types::TemplateMetadata;
use serde::Serialize;

use crate::catalog::TemplateCatalog;

/// Use cases shown per summary entry.
const MAX_SUMMARY_USE_CASES: usize = 3;

/// Compact description of one template as returned by the listing capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSummary {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub tags: Vec<String>,
    pub complexity: String,
    pub use_cases: Vec<String>,
}

impl From<&TemplateMetadata> for TemplateSummary {
    fn from(metadata: &TemplateMetadata) -> Self {
        Self {
            id: metadata.id.clone(),
            name: metadata.name.clone(),
            category: metadata.category.clone(),
            description: metadata.description.clone(),
            tags: metadata.tags.clone(),
            complexity: metadata.complexity.clone(),
            use_cases: metadata.use_cases.iter().take(MAX_SUMMARY_USE_CASES).cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateListing {
    pub templates: Vec<TemplateSummary>,
    pub total: usize,
}

/// List catalog entries, narrowed by an optional category and an optional search string.
///
/// `category` is a case-insensitive substring match. `search` keeps a template when any of its
/// whitespace separated terms occurs in the template's searchable text. Empty filters are ignored.
pub fn list_templates(catalog: &TemplateCatalog, category: Option<&str>, search: Option<&str>) -> TemplateListing {
    let category = category.map(str::to_lowercase).filter(|value| !value.trim().is_empty());
    let terms: Vec<String> = search
        .map(|value| value.split_whitespace().map(str::to_lowercase).collect())
        .unwrap_or_default();

    let templates: Vec<TemplateSummary> = catalog
        .iter()
        .filter(|template| {
            category
                .as_deref()
                .is_none_or(|category| template.category.to_lowercase().contains(category))
        })
        .filter(|template| {
            if terms.is_empty() {
                return true;
            }
            let haystack = searchable_text(template);
            terms.iter().any(|term| haystack.contains(term.as_str()))
        })
        .map(TemplateSummary::from)
        .collect();

    TemplateListing {
        total: templates.len(),
        templates,
    }
}

fn searchable_text(template: &TemplateMetadata) -> String {
    let mut parts: Vec<&str> = vec![template.name.as_str(), template.description.as_str()];
    parts.extend(template.tags.iter().map(String::as_str));
    parts.extend(template.keywords.iter().map(String::as_str));
    parts.extend(template.use_cases.iter().map(String::as_str));
    parts.join(" ").to_lowercase()
}
