use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for template listing.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ListTemplatesRequest {
    #[schemars(description = "Filter by category (e.g., \"AI/Chat\", \"E-commerce/Support\")")]
    pub category: Option<String>,
    #[schemars(description = "Search keywords in name, description, tags, and use cases")]
    pub search: Option<String>,
}

/// Parameters for fetching one template.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GetTemplateRequest {
    /// Exact template identifier. Takes precedence over `user_request`.
    #[schemars(description = "Template ID (if known)")]
    pub template_id: Option<String>,
    #[schemars(description = "User's description of what they want to build. Used to intelligently match the best template.")]
    pub user_request: Option<String>,
}

/// Parameters for creating a workflow from a template.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateFromTemplateRequest {
    #[schemars(description = "Template ID to use (if known)")]
    pub template_id: Option<String>,
    #[schemars(description = "Description of what the user wants. Used to find the best matching template if templateId not provided.")]
    pub user_request: Option<String>,
    #[schemars(description = "Custom name for the new workflow (optional, will use template name if not provided)")]
    pub workflow_name: Option<String>,
    /// Activation is best effort; a failure leaves the created workflow in place.
    #[serde(default)]
    #[schemars(description = "Whether to activate the workflow after creation")]
    pub activate: bool,
}
