//! Template metadata records as stored in the template catalog file.

use serde::{Deserialize, Serialize};

/// Describes one prebuilt workflow without loading its body.
///
/// The matching fields (`tags`, `keywords`, `use_cases`) are treated as unordered sets by the
/// scorer; `complexity` is display-only and never influences ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateMetadata {
    /// Stable identifier, unique within a catalog.
    pub id: String,
    /// Reference to the full workflow document, resolved lazily by the document loader.
    #[serde(rename = "file")]
    pub document_ref: String,
    /// Display name.
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub use_cases: Vec<String>,
    /// Display label such as "beginner" or "advanced".
    #[serde(default)]
    pub complexity: String,
}
