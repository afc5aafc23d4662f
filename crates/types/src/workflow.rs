//! Workflow document models.
//!
//! A [`WorkflowDocument`] is the full body of a template as read from the template store. It may
//! carry fields that only the workflow platform is allowed to assign (persisted id, version
//! stamp, UI metadata, pinned data, tag bindings). Those land in [`WorkflowDocument::extra`] and
//! have no counterpart on [`CreateWorkflowPayload`], so they cannot reach the creation call.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

/// Top-level document keys owned by the workflow platform.
pub const SERVER_OWNED_FIELDS: &[&str] = &[
    "id",
    "versionId",
    "meta",
    "pinData",
    "tags",
    "active",
    "createdAt",
    "updatedAt",
    "isArchived",
    "shared",
    "triggerCount",
];

/// Execution order applied when a document has no settings of its own.
pub const DEFAULT_EXECUTION_ORDER: &str = "v1";

/// A single node inside a workflow graph.
///
/// Unknown node attributes (`typeVersion`, `webhookId`, `disabled`, ...) are preserved in
/// `extra` so nodes round-trip verbatim into the creation payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub position: Vec<Number>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parameters: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Full structure of a workflow as stored in a template file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nodes: Vec<WorkflowNode>,
    /// Graph edges keyed by source node name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub connections: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Map<String, Value>>,
    /// Every other top-level key, including server-owned state.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorkflowDocument {
    /// Parse a document from a raw JSON value.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Returns the server-owned keys present on this document.
    pub fn server_owned_fields(&self) -> Vec<&str> {
        SERVER_OWNED_FIELDS
            .iter()
            .copied()
            .filter(|field| self.extra.contains_key(*field))
            .collect()
    }

    /// Non-empty document name, if any.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|name| !name.is_empty())
    }
}

/// Treats an explicit `null` like an absent key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body sent to the remote workflow creation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateWorkflowPayload {
    pub name: String,
    pub nodes: Vec<WorkflowNode>,
    pub connections: Map<String, Value>,
    pub settings: Map<String, Value>,
}

impl CreateWorkflowPayload {
    /// Settings used when the source document carries none.
    pub fn default_settings() -> Map<String, Value> {
        let mut settings = Map::new();
        settings.insert("executionOrder".to_string(), Value::String(DEFAULT_EXECUTION_ORDER.to_string()));
        settings
    }
}
