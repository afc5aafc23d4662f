//! Turns an identifier or a free-text request into a single template.

use n8n_mcp_types::TemplateMetadata;
use tracing::debug;

use crate::catalog::TemplateCatalog;
use crate::scorer;

/// Caller input for resolution. Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateQuery {
    pub identifier: Option<String>,
    pub free_text: Option<String>,
}

impl TemplateQuery {
    pub fn by_id(identifier: impl Into<String>) -> Self {
        Self {
            identifier: Some(identifier.into()),
            free_text: None,
        }
    }

    pub fn by_text(free_text: impl Into<String>) -> Self {
        Self {
            identifier: None,
            free_text: Some(free_text.into()),
        }
    }

    fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref().filter(|value| !value.is_empty())
    }

    fn free_text(&self) -> Option<&str> {
        self.free_text.as_deref().filter(|value| !value.is_empty())
    }
}

/// Result of resolving a [`TemplateQuery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    Matched(&'a TemplateMetadata),
    NotFound,
}

impl<'a> Resolution<'a> {
    pub fn template(&self) -> Option<&'a TemplateMetadata> {
        match self {
            Resolution::Matched(template) => Some(template),
            Resolution::NotFound => None,
        }
    }
}

/// Resolves queries against a borrowed catalog.
#[derive(Debug, Clone, Copy)]
pub struct TemplateResolver<'a> {
    catalog: &'a TemplateCatalog,
}

impl<'a> TemplateResolver<'a> {
    pub fn new(catalog: &'a TemplateCatalog) -> Self {
        Self { catalog }
    }

    /// Resolve with strict precedence: an identifier always wins and free text is then ignored,
    /// even when the identifier is unknown. Free text falls back to relevance ranking.
    pub fn resolve(&self, query: &TemplateQuery) -> Resolution<'a> {
        if let Some(identifier) = query.identifier() {
            let resolution = self.catalog.find_by_id(identifier).map_or(Resolution::NotFound, Resolution::Matched);
            debug!(identifier, found = resolution.template().is_some(), "resolved template by id");
            return resolution;
        }

        if let Some(free_text) = query.free_text() {
            let resolution = scorer::rank(free_text, self.catalog).map_or(Resolution::NotFound, Resolution::Matched);
            debug!(
                matched = resolution.template().map(|template| template.id.as_str()),
                "resolved template by free text"
            );
            return resolution;
        }

        Resolution::NotFound
    }
}
