//! Shared type definitions for the n8n MCP server.
//!
//! The models here are consumed by the template pipeline, the remote API client, and the
//! MCP tool layer. They deliberately avoid any transport or IO concerns.

pub mod template;
pub mod workflow;

pub use template::TemplateMetadata;
pub use workflow::{CreateWorkflowPayload, DEFAULT_EXECUTION_ORDER, SERVER_OWNED_FIELDS, WorkflowDocument, WorkflowNode};
