//! Declarative pass-through tools that forward arguments to one n8n API endpoint.
//!
//! Each [`PassThroughOperation`] names an HTTP verb, a path template with `{param}`
//! placeholders, and how the remaining arguments are routed (query string or JSON body).

use std::sync::Arc;

use async_trait::async_trait;
use n8n_mcp_api::{ApiRequest, Method, WorkflowApi, encode_path_segment};
use serde_json::{Map, Value, json};
use tracing::debug;

use super::{JsonObject, ToolDescriptor, ToolError, ToolHandler, ToolRegistry, ToolResult};

/// Argument carrying a client-side field projection.
const FIELDS_ARGUMENT: &str = "fields";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpVerb {
    pub fn method(self) -> Method {
        match self {
            HttpVerb::Get => Method::GET,
            HttpVerb::Post => Method::POST,
            HttpVerb::Put => Method::PUT,
            HttpVerb::Delete => Method::DELETE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Boolean,
    StringList,
    Object,
    ObjectList,
}

/// One declared tool argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub description: &'static str,
    /// Allowed values for string parameters. Empty means unrestricted.
    pub allowed: &'static [&'static str],
}

impl ParamSpec {
    const fn optional(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            description,
            allowed: &[],
        }
    }

    const fn required(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            description,
            allowed: &[],
        }
    }

    fn schema(&self) -> Value {
        let mut schema = match self.kind {
            ParamKind::String => json!({ "type": "string" }),
            ParamKind::Integer => json!({ "type": "integer" }),
            ParamKind::Boolean => json!({ "type": "boolean" }),
            ParamKind::StringList => json!({ "type": "array", "items": { "type": "string" } }),
            ParamKind::Object => json!({ "type": "object" }),
            ParamKind::ObjectList => json!({ "type": "array", "items": { "type": "object" } }),
        };
        schema["description"] = Value::String(self.description.to_string());
        if !self.allowed.is_empty() {
            schema["enum"] = json!(self.allowed);
        }
        schema
    }
}

/// Where arguments not consumed by the path end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentRouting {
    Nothing,
    Remaining,
    Only(&'static [&'static str]),
}

/// A single remote operation exposed as a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassThroughOperation {
    pub name: &'static str,
    pub description: &'static str,
    pub verb: HttpVerb,
    pub path: &'static str,
    pub params: &'static [ParamSpec],
    pub query: ArgumentRouting,
    pub body: ArgumentRouting,
    /// Projection applied regardless of the caller's `fields` argument.
    pub forced_fields: Option<&'static [&'static str]>,
}

impl PassThroughOperation {
    /// Names of the `{param}` placeholders in the path template, in order.
    pub fn path_parameters(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        let mut rest = self.path;
        while let Some(start) = rest.find('{') {
            let Some(length) = rest[start..].find('}') else {
                break;
            };
            names.push(&rest[start + 1..start + length]);
            rest = &rest[start + length + 1..];
        }
        names
    }

    pub fn descriptor(&self) -> ToolDescriptor {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in self.params {
            properties.insert(param.name.to_string(), param.schema());
            if param.required {
                required.push(Value::String(param.name.to_string()));
            }
        }

        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".to_string(), Value::Array(required));
        }

        ToolDescriptor {
            name: self.name.to_string(),
            description: self.description.to_string(),
            input_schema: Arc::new(schema),
        }
    }

    /// Translate tool arguments into an API request.
    pub fn build_request(&self, arguments: &JsonObject) -> Result<ApiRequest, ToolError> {
        let path_parameters = self.path_parameters();
        let mut path = self.path.to_string();
        for name in &path_parameters {
            let value = arguments
                .get(*name)
                .and_then(scalar_to_string)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| ToolError::MissingParameter((*name).to_string()))?;
            path = path.replace(&format!("{{{name}}}"), &encode_path_segment(&value));
        }

        let remaining: JsonObject = arguments
            .iter()
            .filter(|(key, _)| key.as_str() != FIELDS_ARGUMENT && !path_parameters.iter().any(|name| name == key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let mut request = ApiRequest::new(self.verb.method(), path);
        for (key, value) in route(&remaining, self.query) {
            if let Some(value) = scalar_to_string(&value) {
                request = request.with_query(key, value);
            }
        }
        if self.body != ArgumentRouting::Nothing {
            request = request.with_body(Value::Object(route(&remaining, self.body)));
        }
        Ok(request)
    }

    /// Field projection requested for this call, if any.
    pub fn projection(&self, arguments: &JsonObject) -> Option<Vec<String>> {
        if let Some(fields) = self.forced_fields {
            return Some(fields.iter().map(|field| (*field).to_string()).collect());
        }
        let fields: Vec<String> = arguments
            .get(FIELDS_ARGUMENT)?
            .as_array()?
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
        (!fields.is_empty()).then_some(fields)
    }
}

fn route(remaining: &JsonObject, routing: ArgumentRouting) -> JsonObject {
    match routing {
        ArgumentRouting::Nothing => JsonObject::new(),
        ArgumentRouting::Remaining => remaining.clone(),
        ArgumentRouting::Only(keys) => remaining
            .iter()
            .filter(|(key, _)| keys.iter().any(|name| name == key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Keep only `fields` on every object of a `data` array, or on the response object itself.
pub fn project_fields(response: Value, fields: &[String]) -> Value {
    let keep = |object: Map<String, Value>| -> Value {
        Value::Object(object.into_iter().filter(|(key, _)| fields.contains(key)).collect())
    };

    match response {
        Value::Object(mut object) => {
            if let Some(Value::Array(items)) = object.get_mut("data") {
                let projected = std::mem::take(items)
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(entry) => keep(entry),
                        other => other,
                    })
                    .collect();
                *items = projected;
                Value::Object(object)
            } else {
                keep(object)
            }
        }
        other => other,
    }
}

/// Executes one [`PassThroughOperation`] against the remote service.
#[derive(Clone)]
pub struct PassThroughHandler {
    operation: PassThroughOperation,
    api: Arc<dyn WorkflowApi>,
}

impl PassThroughHandler {
    pub fn new(operation: PassThroughOperation, api: Arc<dyn WorkflowApi>) -> Self {
        Self { operation, api }
    }
}

#[async_trait]
impl ToolHandler for PassThroughHandler {
    async fn call(&self, arguments: &JsonObject) -> Result<ToolResult, ToolError> {
        let request = self.operation.build_request(arguments)?;
        debug!(tool = self.operation.name, method = %request.method, path = %request.path, "forwarding tool call");

        match self.api.send(request).await {
            Ok(response) => {
                let response = match self.operation.projection(arguments) {
                    Some(fields) => project_fields(response, &fields),
                    None => response,
                };
                Ok(ToolResult::Success(json!({ "data": response })))
            }
            Err(error) => Ok(ToolResult::error_body(&json!({ "error": error.to_string() }))),
        }
    }
}

/// Register every operation of [`OPERATIONS`].
pub fn register_passthrough_tools(registry: &mut ToolRegistry, api: Arc<dyn WorkflowApi>) {
    for operation in OPERATIONS {
        registry.register(operation.descriptor(), Arc::new(PassThroughHandler::new(*operation, Arc::clone(&api))));
    }
}

const WORKFLOW_ID: ParamSpec = ParamSpec::required("id", ParamKind::String, "Workflow ID");
const EXECUTION_ID: ParamSpec = ParamSpec::required("id", ParamKind::String, "Execution ID");
const CURSOR: ParamSpec = ParamSpec::optional("cursor", ParamKind::String, "Pagination cursor");
const WORKFLOW_FILTERS: [ParamSpec; 5] = [
    ParamSpec::optional("active", ParamKind::Boolean, "Filter by active status"),
    ParamSpec::optional("tags", ParamKind::String, "Filter by tag ID"),
    ParamSpec::optional("name", ParamKind::String, "Filter by workflow name"),
    ParamSpec::optional("projectId", ParamKind::String, "Filter by project ID"),
    ParamSpec::optional("limit", ParamKind::Integer, "Number of results (max 250)"),
];
const WORKFLOW_BODY: [ParamSpec; 4] = [
    ParamSpec::optional("name", ParamKind::String, "Name of the workflow"),
    ParamSpec::optional("nodes", ParamKind::ObjectList, "Array of workflow nodes"),
    ParamSpec::optional("connections", ParamKind::Object, "Node connections"),
    ParamSpec::optional("settings", ParamKind::Object, "Workflow settings"),
];

/// Fields kept by the summary listing.
pub const WORKFLOW_SUMMARY_FIELDS: &[&str] = &["id", "name", "active", "tags", "updatedAt", "createdAt"];

/// Workflow and execution operations.
pub const OPERATIONS: &[PassThroughOperation] = &[
    PassThroughOperation {
        name: "n8n_create_workflow",
        description: "Create a new workflow in n8n. You can specify nodes, connections, and settings.",
        verb: HttpVerb::Post,
        path: "/workflows",
        params: &[
            ParamSpec::required("name", ParamKind::String, "Name of the workflow"),
            WORKFLOW_BODY[1],
            WORKFLOW_BODY[2],
            WORKFLOW_BODY[3],
        ],
        query: ArgumentRouting::Nothing,
        body: ArgumentRouting::Remaining,
        forced_fields: None,
    },
    PassThroughOperation {
        name: "n8n_list_workflows",
        description: "List all workflows with full details. Can filter by active status, tags, name, or project. WARNING: Returns complete workflow data including nodes and connections - use n8n_list_workflows_summary for better token efficiency.",
        verb: HttpVerb::Get,
        path: "/workflows",
        params: &[
            WORKFLOW_FILTERS[0],
            WORKFLOW_FILTERS[1],
            WORKFLOW_FILTERS[2],
            WORKFLOW_FILTERS[3],
            WORKFLOW_FILTERS[4],
            CURSOR,
            ParamSpec::optional(
                "fields",
                ParamKind::StringList,
                "Specific fields to return (e.g., [\"id\", \"name\", \"active\"]). Reduces token usage significantly.",
            ),
        ],
        query: ArgumentRouting::Remaining,
        body: ArgumentRouting::Nothing,
        forced_fields: None,
    },
    PassThroughOperation {
        name: "n8n_list_workflows_summary",
        description: "List workflows with minimal data (id, name, active, tags, updatedAt only). Recommended for browsing and listing - uses far fewer tokens than n8n_list_workflows. Use n8n_get_workflow to fetch full details of a specific workflow.",
        verb: HttpVerb::Get,
        path: "/workflows",
        params: &[
            WORKFLOW_FILTERS[0],
            WORKFLOW_FILTERS[1],
            WORKFLOW_FILTERS[2],
            WORKFLOW_FILTERS[3],
            WORKFLOW_FILTERS[4],
            CURSOR,
        ],
        query: ArgumentRouting::Remaining,
        body: ArgumentRouting::Nothing,
        forced_fields: Some(WORKFLOW_SUMMARY_FIELDS),
    },
    PassThroughOperation {
        name: "n8n_get_workflow",
        description: "Get detailed information about a specific workflow by ID.",
        verb: HttpVerb::Get,
        path: "/workflows/{id}",
        params: &[WORKFLOW_ID],
        query: ArgumentRouting::Nothing,
        body: ArgumentRouting::Nothing,
        forced_fields: None,
    },
    PassThroughOperation {
        name: "n8n_update_workflow",
        description: "Update an existing workflow. Can modify name, nodes, connections, settings, etc.",
        verb: HttpVerb::Put,
        path: "/workflows/{id}",
        params: &[WORKFLOW_ID, WORKFLOW_BODY[0], WORKFLOW_BODY[1], WORKFLOW_BODY[2], WORKFLOW_BODY[3]],
        query: ArgumentRouting::Nothing,
        body: ArgumentRouting::Remaining,
        forced_fields: None,
    },
    PassThroughOperation {
        name: "n8n_delete_workflow",
        description: "Delete a workflow permanently.",
        verb: HttpVerb::Delete,
        path: "/workflows/{id}",
        params: &[WORKFLOW_ID],
        query: ArgumentRouting::Nothing,
        body: ArgumentRouting::Nothing,
        forced_fields: None,
    },
    PassThroughOperation {
        name: "n8n_activate_workflow",
        description: "Activate a workflow to start receiving triggers.",
        verb: HttpVerb::Post,
        path: "/workflows/{id}/activate",
        params: &[WORKFLOW_ID],
        query: ArgumentRouting::Nothing,
        body: ArgumentRouting::Nothing,
        forced_fields: None,
    },
    PassThroughOperation {
        name: "n8n_deactivate_workflow",
        description: "Deactivate a workflow to stop receiving triggers.",
        verb: HttpVerb::Post,
        path: "/workflows/{id}/deactivate",
        params: &[WORKFLOW_ID],
        query: ArgumentRouting::Nothing,
        body: ArgumentRouting::Nothing,
        forced_fields: None,
    },
    PassThroughOperation {
        name: "n8n_transfer_workflow",
        description: "Transfer a workflow to another project.",
        verb: HttpVerb::Put,
        path: "/workflows/{id}/transfer",
        params: &[
            WORKFLOW_ID,
            ParamSpec::required("destinationProjectId", ParamKind::String, "Destination project ID"),
        ],
        query: ArgumentRouting::Nothing,
        body: ArgumentRouting::Only(&["destinationProjectId"]),
        forced_fields: None,
    },
    PassThroughOperation {
        name: "n8n_get_workflow_tags",
        description: "Get all tags associated with a workflow.",
        verb: HttpVerb::Get,
        path: "/workflows/{id}/tags",
        params: &[WORKFLOW_ID],
        query: ArgumentRouting::Nothing,
        body: ArgumentRouting::Nothing,
        forced_fields: None,
    },
    PassThroughOperation {
        name: "n8n_update_workflow_tags",
        description: "Update tags for a workflow.",
        verb: HttpVerb::Put,
        path: "/workflows/{id}/tags",
        params: &[
            WORKFLOW_ID,
            ParamSpec::required("tagIds", ParamKind::StringList, "Array of tag IDs"),
        ],
        query: ArgumentRouting::Nothing,
        body: ArgumentRouting::Only(&["tagIds"]),
        forced_fields: None,
    },
    PassThroughOperation {
        name: "n8n_list_executions",
        description: "List workflow executions. Can filter by status, workflow ID, or project. TIP: Set includeData=false and use fields parameter to reduce token usage.",
        verb: HttpVerb::Get,
        path: "/executions",
        params: &[
            ParamSpec {
                name: "status",
                kind: ParamKind::String,
                required: false,
                description: "Filter by execution status",
                allowed: &["error", "success", "waiting", "running", "canceled"],
            },
            ParamSpec::optional("workflowId", ParamKind::String, "Filter by workflow ID"),
            ParamSpec::optional("projectId", ParamKind::String, "Filter by project ID"),
            ParamSpec::optional(
                "includeData",
                ParamKind::Boolean,
                "Include execution data (WARNING: significantly increases token usage)",
            ),
            ParamSpec::optional("limit", ParamKind::Integer, "Number of results"),
            CURSOR,
            ParamSpec::optional(
                "fields",
                ParamKind::StringList,
                "Specific fields to return (e.g., [\"id\", \"status\", \"workflowId\"]). Reduces token usage.",
            ),
        ],
        query: ArgumentRouting::Remaining,
        body: ArgumentRouting::Nothing,
        forced_fields: None,
    },
    PassThroughOperation {
        name: "n8n_get_execution",
        description: "Get detailed information about a specific execution.",
        verb: HttpVerb::Get,
        path: "/executions/{id}",
        params: &[
            EXECUTION_ID,
            ParamSpec::optional("includeData", ParamKind::Boolean, "Include execution data"),
        ],
        query: ArgumentRouting::Only(&["includeData"]),
        body: ArgumentRouting::Nothing,
        forced_fields: None,
    },
    PassThroughOperation {
        name: "n8n_delete_execution",
        description: "Delete an execution record.",
        verb: HttpVerb::Delete,
        path: "/executions/{id}",
        params: &[EXECUTION_ID],
        query: ArgumentRouting::Nothing,
        body: ArgumentRouting::Nothing,
        forced_fields: None,
    },
    PassThroughOperation {
        name: "n8n_retry_execution",
        description: "Retry a failed execution.",
        verb: HttpVerb::Post,
        path: "/executions/{id}/retry",
        params: &[EXECUTION_ID],
        query: ArgumentRouting::Nothing,
        body: ArgumentRouting::Nothing,
        forced_fields: None,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    fn operation(name: &str) -> PassThroughOperation {
        *OPERATIONS.iter().find(|operation| operation.name == name).expect("operation exists")
    }

    fn arguments(value: Value) -> JsonObject {
        value.as_object().cloned().expect("object arguments")
    }

    #[test]
    fn operation_names_are_unique() {
        let mut names: Vec<&str> = OPERATIONS.iter().map(|operation| operation.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), OPERATIONS.len());
    }

    #[test]
    fn every_path_parameter_is_a_required_argument() {
        for operation in OPERATIONS {
            for name in operation.path_parameters() {
                let param = operation.params.iter().find(|param| param.name == name);
                assert!(param.is_some_and(|param| param.required), "{}: {name}", operation.name);
            }
        }
    }

    #[test]
    fn path_parameters_are_percent_encoded() {
        let request = operation("n8n_get_workflow")
            .build_request(&arguments(json!({ "id": "a/b c" })))
            .expect("request builds");

        assert_eq!(request.method, Method::GET);
        assert_eq!(request.path, "/workflows/a%2Fb%20c");
        assert!(request.body.is_none());
    }

    #[test]
    fn missing_path_parameter_is_reported_by_name() {
        let error = operation("n8n_activate_workflow")
            .build_request(&JsonObject::new())
            .expect_err("id is required");

        assert!(matches!(error, ToolError::MissingParameter(ref name) if name == "id"));
    }

    #[test]
    fn update_sends_arguments_without_id() {
        let request = operation("n8n_update_workflow")
            .build_request(&arguments(json!({ "id": "7", "name": "Renamed", "settings": {} })))
            .expect("request builds");

        assert_eq!(request.method, Method::PUT);
        assert_eq!(request.path, "/workflows/7");
        assert_eq!(request.body, Some(json!({ "name": "Renamed", "settings": {} })));
    }

    #[test]
    fn list_routes_scalars_to_query_and_drops_fields() {
        let request = operation("n8n_list_workflows")
            .build_request(&arguments(json!({ "active": true, "limit": 5, "fields": ["id"] })))
            .expect("request builds");

        assert_eq!(
            request.query,
            vec![("active".to_string(), "true".to_string()), ("limit".to_string(), "5".to_string())]
        );
        assert!(request.body.is_none());
    }

    #[test]
    fn transfer_body_carries_only_destination() {
        let request = operation("n8n_transfer_workflow")
            .build_request(&arguments(json!({ "id": "1", "destinationProjectId": "p9", "extra": 1 })))
            .expect("request builds");

        assert_eq!(request.body, Some(json!({ "destinationProjectId": "p9" })));
    }

    #[test]
    fn get_execution_forwards_include_data() {
        let request = operation("n8n_get_execution")
            .build_request(&arguments(json!({ "id": "55", "includeData": false })))
            .expect("request builds");

        assert_eq!(request.path, "/executions/55");
        assert_eq!(request.query, vec![("includeData".to_string(), "false".to_string())]);
    }

    #[test]
    fn summary_forces_projection() {
        let projection = operation("n8n_list_workflows_summary").projection(&arguments(json!({ "fields": ["nodes"] })));
        assert_eq!(projection.as_deref().map(<[String]>::len), Some(WORKFLOW_SUMMARY_FIELDS.len()));
    }

    #[test]
    fn projection_applies_to_data_array_and_plain_objects() {
        let listing = json!({ "data": [{ "id": "1", "name": "A", "nodes": [] }], "nextCursor": "c" });
        let projected = project_fields(listing, &["id".to_string()]);
        assert_eq!(projected, json!({ "data": [{ "id": "1" }], "nextCursor": "c" }));

        let single = project_fields(json!({ "id": "1", "status": "success", "data": {} }), &["status".to_string()]);
        assert_eq!(single, json!({ "status": "success" }));
    }

    #[test]
    fn non_array_data_is_projected_like_any_key() {
        let response = json!({ "id": "1", "data": { "resultData": { "runData": {} } }, "other": 2 });
        let projected = project_fields(response, &["id".to_string(), "data".to_string()]);
        assert_eq!(projected, json!({ "id": "1", "data": { "resultData": { "runData": {} } } }));
    }

    #[test]
    fn descriptor_schema_lists_required_and_enums() {
        let descriptor = operation("n8n_list_executions").descriptor();
        let properties = &descriptor.input_schema["properties"];

        assert_eq!(properties["status"]["enum"][0], "error");
        assert_eq!(properties["fields"]["items"]["type"], "string");
        assert!(descriptor.input_schema.get("required").is_none());

        let descriptor = operation("n8n_update_workflow_tags").descriptor();
        assert_eq!(descriptor.input_schema["required"], json!(["id", "tagIds"]));
    }
}
