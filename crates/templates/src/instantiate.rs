//! Create-then-activate protocol for turning a resolved template into a live workflow.

use n8n_mcp_api::WorkflowApi;
use n8n_mcp_types::{CreateWorkflowPayload, TemplateMetadata, WorkflowDocument};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::loader::DocumentLoader;
use crate::resolver::Resolution;
use crate::{LIST_TEMPLATES_TOOL, NO_MATCH_ERROR};

const LOAD_FAILED_ERROR: &str = "Failed to load template file";
const ACTIVATION_FAILED_MESSAGE: &str = "Workflow created but activation failed";

/// Caller options for one instantiation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstantiationRequest {
    /// Overrides every other name source when non-empty.
    pub workflow_name: Option<String>,
    pub activate: bool,
}

/// Terminal result of an instantiation request.
#[derive(Debug, Clone, PartialEq)]
pub enum InstantiationOutcome {
    /// Persisted; activation was not requested or could not be attempted.
    Created {
        template: TemplateMetadata,
        workflow: Value,
        url: Option<String>,
    },
    CreatedActivated {
        template: TemplateMetadata,
        workflow: Value,
        url: Option<String>,
    },
    /// Persisted but the activation call failed. Not an overall failure.
    CreatedActivationFailed {
        template: TemplateMetadata,
        workflow: Value,
        activation_error: String,
        url: Option<String>,
    },
    ResolutionFailed {
        suggestion: String,
    },
    LoadFailed {
        template: TemplateMetadata,
        reason: String,
    },
    CreationFailed {
        template: TemplateMetadata,
        error: String,
    },
}

impl InstantiationOutcome {
    /// Whether the outcome is reported with the error flag set.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::ResolutionFailed { .. } | Self::LoadFailed { .. } | Self::CreationFailed { .. }
        )
    }

    /// Identity of the created workflow, if one was persisted.
    pub fn workflow_id(&self) -> Option<String> {
        match self {
            Self::Created { workflow, .. }
            | Self::CreatedActivated { workflow, .. }
            | Self::CreatedActivationFailed { workflow, .. } => workflow_id(workflow),
            _ => None,
        }
    }

    /// Serialized response object for the envelope.
    pub fn response_body(&self) -> Value {
        match self {
            Self::Created { template, workflow, url } | Self::CreatedActivated { template, workflow, url } => {
                let mut body = json!({
                    "success": true,
                    "workflow": workflow,
                    "template": template,
                    "message": format!("Successfully created workflow from template: {}", template.name),
                    "activated": matches!(self, Self::CreatedActivated { .. }),
                });
                if let Some(url) = url {
                    body["url"] = Value::String(url.clone());
                }
                body
            }
            Self::CreatedActivationFailed {
                template,
                workflow,
                activation_error,
                url,
            } => {
                let mut body = json!({
                    "workflow": workflow,
                    "activationError": activation_error,
                    "message": ACTIVATION_FAILED_MESSAGE,
                    "template": template,
                });
                if let Some(url) = url {
                    body["url"] = Value::String(url.clone());
                }
                body
            }
            Self::ResolutionFailed { suggestion } => resolution_failed_body(suggestion),
            Self::LoadFailed { template, .. } => load_failed_body(template),
            Self::CreationFailed { template, error } => json!({ "error": error, "template": template }),
        }
    }
}

/// Hint returned whenever no template matched.
pub fn no_match_suggestion() -> String {
    format!("Use {LIST_TEMPLATES_TOOL} to see available templates")
}

/// Body reported when resolution produced no template.
pub fn resolution_failed_body(suggestion: &str) -> Value {
    json!({ "error": NO_MATCH_ERROR, "suggestion": suggestion })
}

/// Body reported when a resolved template's document could not be loaded.
pub fn load_failed_body(template: &TemplateMetadata) -> Value {
    json!({ "error": LOAD_FAILED_ERROR, "template": template })
}

/// Build the body for the remote creation call.
///
/// Only `name`, `nodes`, `connections` and `settings` are carried over; everything else on the
/// document, server-owned state included, is dropped.
pub fn build_creation_payload(
    document: &WorkflowDocument,
    override_name: Option<&str>,
    metadata: &TemplateMetadata,
) -> CreateWorkflowPayload {
    let name = override_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .or_else(|| document.display_name())
        .unwrap_or(metadata.name.as_str())
        .to_string();

    let stripped = document.server_owned_fields();
    if !stripped.is_empty() {
        debug!(template = %metadata.id, ?stripped, "dropping server-owned fields from template document");
    }

    CreateWorkflowPayload {
        name,
        nodes: document.nodes.clone(),
        connections: document.connections.clone(),
        settings: document.settings.clone().unwrap_or_else(CreateWorkflowPayload::default_settings),
    }
}

/// Runs the instantiation protocol against a remote workflow service.
#[derive(Clone)]
pub struct WorkflowInstantiator {
    loader: DocumentLoader,
    api: Arc<dyn WorkflowApi>,
}

impl WorkflowInstantiator {
    pub fn new(loader: DocumentLoader, api: Arc<dyn WorkflowApi>) -> Self {
        Self { loader, api }
    }

    pub async fn instantiate(&self, resolution: Resolution<'_>, request: &InstantiationRequest) -> InstantiationOutcome {
        let Some(metadata) = resolution.template() else {
            return InstantiationOutcome::ResolutionFailed {
                suggestion: no_match_suggestion(),
            };
        };
        let template = metadata.clone();

        let loaded = match self.loader.load(metadata).await {
            Ok(loaded) => loaded,
            Err(error) => {
                return InstantiationOutcome::LoadFailed {
                    template,
                    reason: error.reason,
                };
            }
        };

        let payload = build_creation_payload(&loaded.document, request.workflow_name.as_deref(), metadata);
        let workflow = match self.api.create_workflow(&payload).await {
            Ok(workflow) => workflow,
            Err(error) => {
                warn!(template = %template.id, %error, "workflow creation rejected");
                return InstantiationOutcome::CreationFailed {
                    template,
                    error: error.to_string(),
                };
            }
        };

        let id = workflow_id(&workflow);
        let url = id.as_deref().and_then(|id| self.api.workflow_url(id));
        info!(template = %template.id, workflow_id = ?id, "workflow created from template");

        let Some(id) = id.filter(|_| request.activate) else {
            return InstantiationOutcome::Created { template, workflow, url };
        };

        match self.api.activate_workflow(&id).await {
            Ok(_) => {
                info!(workflow_id = %id, "workflow activated");
                InstantiationOutcome::CreatedActivated { template, workflow, url }
            }
            Err(error) => {
                warn!(workflow_id = %id, %error, "workflow created but activation failed");
                InstantiationOutcome::CreatedActivationFailed {
                    template,
                    workflow,
                    activation_error: error.to_string(),
                    url,
                }
            }
        }
    }
}

impl std::fmt::Debug for WorkflowInstantiator {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("WorkflowInstantiator")
            .field("loader", &self.loader)
            .finish_non_exhaustive()
    }
}

/// Non-empty id of a created workflow, accepting string or numeric ids.
fn workflow_id(workflow: &Value) -> Option<String> {
    match workflow.get("id")? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TemplateCatalog;
    use crate::store::MemoryTemplateStore;
    use async_trait::async_trait;
    use n8n_mcp_api::{ApiError, ApiRequest};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeApi {
        create_response: Option<Value>,
        create_error: Option<String>,
        activation_error: Option<String>,
        created: Mutex<Vec<Value>>,
        activated: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl WorkflowApi for FakeApi {
        async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
            Err(ApiError::Client(format!("unexpected request to {}", request.path)))
        }

        async fn create_workflow(&self, payload: &CreateWorkflowPayload) -> Result<Value, ApiError> {
            self.created.lock().expect("lock").push(serde_json::to_value(payload).expect("payload"));
            if let Some(message) = &self.create_error {
                return Err(ApiError::Rejected {
                    status: 400,
                    message: message.clone(),
                });
            }
            Ok(self.create_response.clone().unwrap_or_else(|| json!({ "id": "wf-1", "name": payload.name })))
        }

        async fn activate_workflow(&self, id: &str) -> Result<Value, ApiError> {
            self.activated.lock().expect("lock").push(id.to_string());
            match &self.activation_error {
                Some(message) => Err(ApiError::Rejected {
                    status: 400,
                    message: message.clone(),
                }),
                None => Ok(json!({ "id": id, "active": true })),
            }
        }

        fn workflow_url(&self, id: &str) -> Option<String> {
            Some(format!("http://n8n.test/workflow/{id}"))
        }
    }

    fn metadata() -> TemplateMetadata {
        serde_json::from_value(json!({ "id": "slack-notifier", "file": "slack.json", "name": "Slack Notifier" })).expect("metadata")
    }

    fn document() -> Value {
        json!({
            "id": "99",
            "versionId": "v-1",
            "name": "Slack Template",
            "meta": { "templateCredsSetupCompleted": true },
            "pinData": { "Webhook": [{ "json": {} }] },
            "tags": [{ "id": "3", "name": "chat" }],
            "active": true,
            "nodes": [{ "name": "Webhook", "type": "n8n-nodes-base.webhook", "position": [0, 0], "parameters": {} }],
            "connections": {}
        })
    }

    fn setup(api: FakeApi) -> (TemplateCatalog, WorkflowInstantiator, Arc<FakeApi>) {
        let store = MemoryTemplateStore::new().with_template(metadata(), document());
        let catalog = TemplateCatalog::from_records(vec![metadata()]);
        let api = Arc::new(api);
        let instantiator = WorkflowInstantiator::new(DocumentLoader::new(Arc::new(store)), api.clone());
        (catalog, instantiator, api)
    }

    #[tokio::test]
    async fn activation_failure_keeps_created_workflow() {
        let (catalog, instantiator, api) = setup(FakeApi {
            activation_error: Some("Workflow has no trigger node".to_string()),
            ..FakeApi::default()
        });
        let request = InstantiationRequest {
            workflow_name: None,
            activate: true,
        };

        let outcome = instantiator
            .instantiate(Resolution::Matched(catalog.find_by_id("slack-notifier").expect("template")), &request)
            .await;

        assert!(matches!(outcome, InstantiationOutcome::CreatedActivationFailed { .. }));
        assert!(!outcome.is_failure());
        assert_eq!(outcome.workflow_id().as_deref(), Some("wf-1"));
        assert_eq!(api.activated.lock().expect("lock").as_slice(), ["wf-1"]);

        let body = outcome.response_body();
        assert_eq!(body["activationError"], "Workflow has no trigger node");
        assert_eq!(body["workflow"]["id"], "wf-1");
        assert_eq!(body["message"], "Workflow created but activation failed");
    }

    #[tokio::test]
    async fn server_owned_fields_never_reach_creation() {
        let (catalog, instantiator, api) = setup(FakeApi::default());

        instantiator
            .instantiate(Resolution::Matched(catalog.find_by_id("slack-notifier").expect("template")), &InstantiationRequest::default())
            .await;

        let created = api.created.lock().expect("lock");
        let payload = created[0].as_object().expect("object payload");
        for field in ["id", "versionId", "meta", "pinData", "tags", "active"] {
            assert!(!payload.contains_key(field), "{field} leaked into the payload");
        }
        assert_eq!(payload["settings"], json!({ "executionOrder": "v1" }));
        assert_eq!(payload["name"], "Slack Template");
    }

    #[tokio::test]
    async fn successful_activation_reports_activated() {
        let (catalog, instantiator, _) = setup(FakeApi::default());
        let request = InstantiationRequest {
            workflow_name: Some("Team alerts".to_string()),
            activate: true,
        };

        let outcome = instantiator
            .instantiate(Resolution::Matched(catalog.find_by_id("slack-notifier").expect("template")), &request)
            .await;

        assert!(matches!(outcome, InstantiationOutcome::CreatedActivated { .. }));
        let body = outcome.response_body();
        assert_eq!(body["success"], true);
        assert_eq!(body["activated"], true);
        assert_eq!(body["workflow"]["name"], "Team alerts");
        assert_eq!(body["url"], "http://n8n.test/workflow/wf-1");
        assert_eq!(body["message"], "Successfully created workflow from template: Slack Notifier");
    }

    #[tokio::test]
    async fn creation_without_id_skips_activation() {
        let (catalog, instantiator, api) = setup(FakeApi {
            create_response: Some(json!({ "name": "no id" })),
            ..FakeApi::default()
        });
        let request = InstantiationRequest {
            workflow_name: None,
            activate: true,
        };

        let outcome = instantiator
            .instantiate(Resolution::Matched(catalog.find_by_id("slack-notifier").expect("template")), &request)
            .await;

        assert!(matches!(outcome, InstantiationOutcome::Created { url: None, .. }));
        assert!(api.activated.lock().expect("lock").is_empty());
        assert!(outcome.response_body().get("url").is_none());
    }

    #[tokio::test]
    async fn creation_rejection_echoes_template_not_payload() {
        let (catalog, instantiator, api) = setup(FakeApi {
            create_error: Some("request/body must have required property 'name'".to_string()),
            ..FakeApi::default()
        });
        let request = InstantiationRequest {
            workflow_name: None,
            activate: true,
        };

        let outcome = instantiator
            .instantiate(Resolution::Matched(catalog.find_by_id("slack-notifier").expect("template")), &request)
            .await;

        assert!(outcome.is_failure());
        assert!(api.activated.lock().expect("lock").is_empty());
        let body = outcome.response_body();
        assert_eq!(body["error"], "request/body must have required property 'name'");
        assert_eq!(body["template"]["id"], "slack-notifier");
        assert!(body.get("workflow").is_none());
    }

    #[tokio::test]
    async fn not_found_suggests_listing() {
        let (_, instantiator, api) = setup(FakeApi::default());

        let outcome = instantiator.instantiate(Resolution::NotFound, &InstantiationRequest::default()).await;

        assert!(outcome.is_failure());
        assert_eq!(
            outcome.response_body(),
            json!({
                "error": "No matching template found",
                "suggestion": "Use n8n_list_workflow_templates to see available templates"
            })
        );
        assert!(api.created.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn unreadable_document_is_load_failure() {
        let dangling: TemplateMetadata =
            serde_json::from_value(json!({ "id": "broken", "file": "missing.json", "name": "Broken" })).expect("metadata");
        let store = MemoryTemplateStore::new().with_dangling_template(dangling.clone());
        let api = Arc::new(FakeApi::default());
        let instantiator = WorkflowInstantiator::new(DocumentLoader::new(Arc::new(store)), api.clone());

        let outcome = instantiator.instantiate(Resolution::Matched(&dangling), &InstantiationRequest::default()).await;

        assert!(matches!(outcome, InstantiationOutcome::LoadFailed { .. }));
        assert_eq!(outcome.response_body()["error"], "Failed to load template file");
        assert_eq!(outcome.response_body()["template"]["file"], "missing.json");
        assert!(api.created.lock().expect("lock").is_empty());
    }

    #[test]
    fn payload_name_precedence() {
        let metadata = metadata();
        let named = WorkflowDocument::from_value(json!({ "name": "From Document", "nodes": [] })).expect("document");
        let unnamed = WorkflowDocument::from_value(json!({ "nodes": [] })).expect("document");

        assert_eq!(build_creation_payload(&named, Some("Override"), &metadata).name, "Override");
        assert_eq!(build_creation_payload(&named, Some(""), &metadata).name, "From Document");
        assert_eq!(build_creation_payload(&named, None, &metadata).name, "From Document");
        assert_eq!(build_creation_payload(&unnamed, None, &metadata).name, "Slack Notifier");
    }

    #[test]
    fn document_settings_are_kept() {
        let document = WorkflowDocument::from_value(json!({
            "nodes": [],
            "settings": { "executionOrder": "v0", "timezone": "Europe/Berlin" }
        }))
        .expect("document");

        let payload = build_creation_payload(&document, None, &metadata());
        assert_eq!(payload.settings.get("timezone"), Some(&json!("Europe/Berlin")));
        assert_eq!(payload.settings.get("executionOrder"), Some(&json!("v0")));
    }

    #[test]
    fn numeric_ids_are_accepted() {
        assert_eq!(workflow_id(&json!({ "id": 17 })).as_deref(), Some("17"));
        assert_eq!(workflow_id(&json!({ "id": "" })), None);
        assert_eq!(workflow_id(&json!({})), None);
    }
}
