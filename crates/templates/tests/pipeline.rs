use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use n8n_mcp_api::{ApiError, ApiRequest, WorkflowApi};
use n8n_mcp_templates::{
    DocumentLoader, FsTemplateStore, InstantiationOutcome, InstantiationRequest, METADATA_FILE_NAME, TemplateCatalog, TemplateQuery,
    TemplateResolver, WorkflowInstantiator, list_templates,
};
use serde_json::{Value, json};
use tempfile::tempdir;

fn shipped_templates() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../templates")
}

#[derive(Default)]
struct RecordingApi {
    payloads: Mutex<Vec<Value>>,
}

#[async_trait]
impl WorkflowApi for RecordingApi {
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        if request.path == "/workflows" {
            let body = request.body.unwrap_or(Value::Null);
            self.payloads.lock().expect("lock").push(body.clone());
            let mut created = body;
            created["id"] = json!("created-1");
            return Ok(created);
        }
        if request.path.ends_with("/activate") {
            return Ok(json!({ "active": true }));
        }
        Err(ApiError::Rejected {
            status: 404,
            message: "not found".to_string(),
        })
    }
}

#[tokio::test]
async fn shipped_catalog_loads_and_every_document_parses() {
    let store = Arc::new(FsTemplateStore::new(shipped_templates()));
    let catalog = TemplateCatalog::load(store.as_ref()).await;
    assert!(!catalog.is_empty());

    let loader = DocumentLoader::new(store);
    for template in catalog.iter() {
        let loaded = loader.load(template).await.unwrap_or_else(|error| panic!("{error}"));
        assert!(!loaded.document.nodes.is_empty(), "{} has no nodes", template.id);
    }
}

#[tokio::test]
async fn free_text_request_creates_workflow_without_server_fields() {
    let store = Arc::new(FsTemplateStore::new(shipped_templates()));
    let catalog = TemplateCatalog::load(store.as_ref()).await;
    let api = Arc::new(RecordingApi::default());
    let instantiator = WorkflowInstantiator::new(DocumentLoader::new(store), api.clone());

    let resolution = TemplateResolver::new(&catalog).resolve(&TemplateQuery::by_text("daily email digest"));
    assert_eq!(resolution.template().map(|t| t.id.as_str()), Some("scheduled-email-report"));

    let outcome = instantiator
        .instantiate(
            resolution,
            &InstantiationRequest {
                workflow_name: Some("Morning metrics".to_string()),
                activate: true,
            },
        )
        .await;
    assert!(matches!(outcome, InstantiationOutcome::CreatedActivated { .. }));

    let payloads = api.payloads.lock().expect("lock");
    let payload = payloads[0].as_object().expect("object payload");
    let mut keys: Vec<&str> = payload.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["connections", "name", "nodes", "settings"]);
    assert_eq!(payload["name"], "Morning metrics");
    assert_eq!(payload["settings"]["timezone"], "UTC");
}

#[tokio::test]
async fn slack_request_selects_slack_notifier() {
    let catalog = TemplateCatalog::load(&FsTemplateStore::new(shipped_templates())).await;
    let resolution = TemplateResolver::new(&catalog).resolve(&TemplateQuery::by_text("I want to notify my team on slack"));

    assert_eq!(resolution.template().map(|t| t.id.as_str()), Some("slack-notifier"));
}

#[tokio::test]
async fn dangling_document_reference_fails_at_load_time() {
    let directory = tempdir().expect("tempdir");
    let metadata = json!({
        "templates": [
            { "id": "ghost", "file": "ghost.json", "name": "Ghost" },
            { "id": "escape", "file": "../outside.json", "name": "Escape" }
        ]
    });
    std::fs::write(directory.path().join(METADATA_FILE_NAME), metadata.to_string()).expect("write metadata");

    let store = Arc::new(FsTemplateStore::new(directory.path()));
    let catalog = TemplateCatalog::load(store.as_ref()).await;
    assert_eq!(catalog.len(), 2);
    assert_eq!(list_templates(&catalog, None, Some("ghost")).total, 1);

    let api = Arc::new(RecordingApi::default());
    let instantiator = WorkflowInstantiator::new(DocumentLoader::new(store), api.clone());
    for id in ["ghost", "escape"] {
        let resolution = TemplateResolver::new(&catalog).resolve(&TemplateQuery::by_id(id));
        let outcome = instantiator.instantiate(resolution, &InstantiationRequest::default()).await;
        assert!(matches!(outcome, InstantiationOutcome::LoadFailed { .. }), "{id}");
    }
    assert!(api.payloads.lock().expect("lock").is_empty());
}
