//! Tool dispatch: a static registry of named handlers behind a uniform call contract.
//!
//! Every capability exposed to the agent runtime is a [`RegisteredTool`]: a descriptor (name,
//! description, JSON input schema) plus a [`ToolHandler`]. The [`Dispatcher`] routes a
//! [`ToolInvocation`] to its handler and always produces exactly one [`ToolResult`].

mod dispatcher;
pub mod passthrough;
pub mod templates;

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

pub use dispatcher::Dispatcher;

/// JSON object used for tool arguments and schemas.
pub type JsonObject = Map<String, Value>;

/// One call from the agent runtime.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolInvocation {
    pub name: String,
    pub arguments: JsonObject,
}

impl ToolInvocation {
    pub fn new(name: impl Into<String>, arguments: JsonObject) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Terminal outcome of one invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    Success(Value),
    Error(String),
}

impl ToolResult {
    /// Error outcome whose message is a serialized response object.
    pub fn error_body(body: &Value) -> Self {
        ToolResult::Error(render_json(body))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ToolResult::Error(_))
    }

    /// Text carried by the response envelope.
    pub fn text(&self) -> String {
        match self {
            ToolResult::Success(payload) => render_json(payload),
            ToolResult::Error(message) => message.clone(),
        }
    }
}

fn render_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Failures raised by a handler. The dispatcher reports them as `Error: <message>`.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("missing required parameter '{0}'")]
    MissingParameter(String),
    #[error("{0}")]
    Internal(String),
}

/// Uniform `(arguments) -> outcome` contract shared by every capability.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, arguments: &JsonObject) -> Result<ToolResult, ToolError>;
}

/// Name, description and input schema advertised for a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Arc<JsonObject>,
}

#[derive(Clone)]
pub struct RegisteredTool {
    pub descriptor: ToolDescriptor,
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for RegisteredTool {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("RegisteredTool").field("descriptor", &self.descriptor).finish_non_exhaustive()
    }
}

/// Ordered name to tool mapping, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A later registration under the same name replaces the earlier one.
    pub fn register(&mut self, descriptor: ToolDescriptor, handler: Arc<dyn ToolHandler>) {
        self.tools.insert(descriptor.name.clone(), RegisteredTool { descriptor, handler });
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.get(name)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.values().map(|tool| &tool.descriptor)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Deserialize typed arguments from the raw argument map.
pub(crate) fn parse_arguments<T: DeserializeOwned>(arguments: &JsonObject) -> Result<T, ToolError> {
    serde_json::from_value(Value::Object(arguments.clone())).map_err(|error| ToolError::InvalidArguments(error.to_string()))
}

/// JSON schema for a typed argument struct.
pub(crate) fn schema_for<T: schemars::JsonSchema>() -> Arc<JsonObject> {
    let schema = schemars::schema_for!(T);
    Arc::new(schema.as_object().cloned().unwrap_or_default())
}
