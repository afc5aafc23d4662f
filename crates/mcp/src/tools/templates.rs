//! Template capabilities: list, get and create-from-template.

use std::sync::Arc;

use async_trait::async_trait;
use n8n_mcp_templates::{
    DocumentLoader, InstantiationRequest, LIST_TEMPLATES_TOOL, Resolution, TemplateCatalog, TemplateQuery, TemplateResolver,
    WorkflowInstantiator, list_templates, load_failed_body, no_match_suggestion, resolution_failed_body,
};
use serde_json::json;

use super::{JsonObject, ToolDescriptor, ToolError, ToolHandler, ToolRegistry, ToolResult, parse_arguments, schema_for};
use crate::server::schemas::{CreateFromTemplateRequest, GetTemplateRequest, ListTemplatesRequest};

pub const GET_TEMPLATE_TOOL: &str = "n8n_get_workflow_template";
pub const CREATE_FROM_TEMPLATE_TOOL: &str = "n8n_create_workflow_from_template";

/// Lists catalog entries with optional category and search filters.
#[derive(Debug, Clone)]
pub struct ListTemplatesHandler {
    catalog: Arc<TemplateCatalog>,
}

impl ListTemplatesHandler {
    pub fn new(catalog: Arc<TemplateCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl ToolHandler for ListTemplatesHandler {
    async fn call(&self, arguments: &JsonObject) -> Result<ToolResult, ToolError> {
        let request: ListTemplatesRequest = parse_arguments(arguments)?;
        let listing = list_templates(&self.catalog, request.category.as_deref(), request.search.as_deref());
        let body = serde_json::to_value(listing).map_err(|error| ToolError::Internal(error.to_string()))?;
        Ok(ToolResult::Success(body))
    }
}

/// Resolves one template and returns its metadata together with the stored document.
#[derive(Debug, Clone)]
pub struct GetTemplateHandler {
    catalog: Arc<TemplateCatalog>,
    loader: DocumentLoader,
}

impl GetTemplateHandler {
    pub fn new(catalog: Arc<TemplateCatalog>, loader: DocumentLoader) -> Self {
        Self { catalog, loader }
    }
}

#[async_trait]
impl ToolHandler for GetTemplateHandler {
    async fn call(&self, arguments: &JsonObject) -> Result<ToolResult, ToolError> {
        let request: GetTemplateRequest = parse_arguments(arguments)?;
        let query = TemplateQuery {
            identifier: request.template_id,
            free_text: request.user_request,
        };

        let Resolution::Matched(metadata) = TemplateResolver::new(&self.catalog).resolve(&query) else {
            return Ok(ToolResult::error_body(&resolution_failed_body(&no_match_suggestion())));
        };

        match self.loader.read(metadata).await {
            Ok(stored) => Ok(ToolResult::Success(json!({
                "metadata": stored.metadata,
                "workflow": stored.raw,
                "message": format!("Found template: {}", stored.metadata.name),
            }))),
            Err(error) => Ok(ToolResult::error_body(&load_failed_body(&error.metadata))),
        }
    }
}

/// Resolves a template and instantiates it on the remote workflow service.
#[derive(Debug, Clone)]
pub struct CreateFromTemplateHandler {
    catalog: Arc<TemplateCatalog>,
    instantiator: WorkflowInstantiator,
}

impl CreateFromTemplateHandler {
    pub fn new(catalog: Arc<TemplateCatalog>, instantiator: WorkflowInstantiator) -> Self {
        Self { catalog, instantiator }
    }
}

#[async_trait]
impl ToolHandler for CreateFromTemplateHandler {
    async fn call(&self, arguments: &JsonObject) -> Result<ToolResult, ToolError> {
        let request: CreateFromTemplateRequest = parse_arguments(arguments)?;
        let query = TemplateQuery {
            identifier: request.template_id,
            free_text: request.user_request,
        };
        let options = InstantiationRequest {
            workflow_name: request.workflow_name,
            activate: request.activate,
        };

        let resolution = TemplateResolver::new(&self.catalog).resolve(&query);
        let outcome = self.instantiator.instantiate(resolution, &options).await;
        let body = outcome.response_body();
        if outcome.is_failure() {
            Ok(ToolResult::error_body(&body))
        } else {
            Ok(ToolResult::Success(body))
        }
    }
}

/// Register the three template capabilities.
pub fn register_template_tools(
    registry: &mut ToolRegistry,
    catalog: Arc<TemplateCatalog>,
    loader: DocumentLoader,
    instantiator: WorkflowInstantiator,
) {
    registry.register(
        ToolDescriptor {
            name: LIST_TEMPLATES_TOOL.to_string(),
            description: "List available workflow templates with their metadata. Use this to discover what pre-built workflows are available."
                .to_string(),
            input_schema: schema_for::<ListTemplatesRequest>(),
        },
        Arc::new(ListTemplatesHandler::new(Arc::clone(&catalog))),
    );
    registry.register(
        ToolDescriptor {
            name: GET_TEMPLATE_TOOL.to_string(),
            description: "Get a specific workflow template by ID or intelligently find the best matching template based on user requirements."
                .to_string(),
            input_schema: schema_for::<GetTemplateRequest>(),
        },
        Arc::new(GetTemplateHandler::new(Arc::clone(&catalog), loader)),
    );
    registry.register(
        ToolDescriptor {
            name: CREATE_FROM_TEMPLATE_TOOL.to_string(),
            description: "Create a new workflow in n8n based on a template. Automatically selects the best template if not specified."
                .to_string(),
            input_schema: schema_for::<CreateFromTemplateRequest>(),
        },
        Arc::new(CreateFromTemplateHandler::new(catalog, instantiator)),
    );
}
