//! Model Context Protocol (MCP) server exposing an n8n instance to agent runtimes.
//!
//! This crate wires configuration, the tool registry (pass-through REST operations plus the
//! template capabilities) and the stdio/HTTP transports together.

pub mod config;
pub mod server;
pub mod tools;

use std::sync::Arc;

use n8n_mcp_api::WorkflowApi;
use n8n_mcp_templates::{DocumentLoader, TemplateCatalog, TemplateStore, WorkflowInstantiator};

pub use config::{ConfigError, ResolvedConfig, ServerConfig};
pub use server::{McpHttpServer, N8nMcpCore, RunningMcpHttpServer, serve_stdio};
pub use tools::{Dispatcher, ToolInvocation, ToolRegistry, ToolResult};

/// Build the full tool registry: every pass-through operation followed by the template tools.
pub fn build_registry(catalog: Arc<TemplateCatalog>, store: Arc<dyn TemplateStore>, api: Arc<dyn WorkflowApi>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    tools::passthrough::register_passthrough_tools(&mut registry, Arc::clone(&api));

    let loader = DocumentLoader::new(store);
    let instantiator = WorkflowInstantiator::new(loader.clone(), api);
    tools::templates::register_template_tools(&mut registry, catalog, loader, instantiator);
    registry
}
