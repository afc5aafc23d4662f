use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, ErrorData, Implementation, ListToolsResult, PaginatedRequestParams, ProtocolVersion,
    ServerCapabilities, ServerInfo, Tool,
};
use rmcp::{RoleServer, ServerHandler, service::RequestContext};
use tracing::debug;

use crate::server::log_payload::build_log_payload;
use crate::tools::{Dispatcher, ToolInvocation, ToolResult};

const SERVER_INSTRUCTIONS: &str = "Tools for managing an n8n instance.\n\
WORKFLOWS: n8n_list_workflows_summary to browse, n8n_get_workflow for full detail, n8n_create_workflow / n8n_update_workflow to edit.\n\
EXECUTIONS: n8n_list_executions with includeData=false and fields to keep responses small.\n\
TEMPLATES: n8n_list_workflow_templates to discover, n8n_get_workflow_template to inspect, \
n8n_create_workflow_from_template with templateId or userRequest to instantiate (activate=true to activate).";

/// MCP handler backed by a shared [`Dispatcher`].
///
/// Cheap to clone; the HTTP host builds one per session while all sessions share the
/// dispatcher and therefore its invocation gate.
#[derive(Clone, Debug)]
pub struct N8nMcpCore {
    dispatcher: Arc<Dispatcher>,
}

impl N8nMcpCore {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    fn tools(&self) -> Vec<Tool> {
        self.dispatcher
            .registry()
            .descriptors()
            .map(|descriptor| Tool::new(descriptor.name.clone(), descriptor.description.clone(), Arc::clone(&descriptor.input_schema)))
            .collect()
    }
}

/// Envelope mapping: one text content plus the error flag.
pub fn into_call_tool_result(result: &ToolResult) -> CallToolResult {
    let content = vec![Content::text(result.text())];
    if result.is_error() {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    }
}

impl ServerHandler for N8nMcpCore {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            protocol_version: ProtocolVersion::LATEST,
            server_info: Implementation {
                name: "n8n-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: Some("n8n MCP".to_string()),
                ..Default::default()
            },
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, ErrorData>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult::with_all_items(self.tools())))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, ErrorData>> + Send + '_ {
        async move {
            let invocation = ToolInvocation::new(request.name.to_string(), request.arguments.unwrap_or_default());
            let result = self.dispatcher.dispatch(invocation.clone()).await;

            let payload = build_log_payload(&invocation.name, &invocation.arguments, &result);
            debug!(tool = %invocation.name, is_error = result.is_error(), %payload, "tool call completed");

            Ok(into_call_tool_result(&result))
        }
    }
}
