//! Workflow template pipeline.
//!
//! Resolution runs leaves first: a [`TemplateStore`] feeds an immutable [`TemplateCatalog`];
//! the [`TemplateResolver`] picks one template either by exact id or by [`scorer::rank`];
//! the [`DocumentLoader`] materializes its document; and the [`WorkflowInstantiator`] turns
//! the document into a creation payload, creates it remotely, and optionally activates it.

pub mod catalog;
pub mod instantiate;
pub mod listing;
pub mod loader;
pub mod resolver;
pub mod scorer;
pub mod store;

pub use catalog::TemplateCatalog;
pub use instantiate::{
    InstantiationOutcome, InstantiationRequest, WorkflowInstantiator, build_creation_payload, load_failed_body, no_match_suggestion,
    resolution_failed_body,
};
pub use listing::{TemplateListing, TemplateSummary, list_templates};
pub use loader::{DocumentLoader, LoadError, LoadedTemplate, StoredTemplate};
pub use resolver::{Resolution, TemplateQuery, TemplateResolver};
pub use store::{FsTemplateStore, METADATA_FILE_NAME, MemoryTemplateStore, StoreError, TemplateStore};

/// Name of the listing capability, referenced in remediation hints.
pub const LIST_TEMPLATES_TOOL: &str = "n8n_list_workflow_templates";

/// Error text used whenever resolution yields no template.
pub const NO_MATCH_ERROR: &str = "No matching template found";
