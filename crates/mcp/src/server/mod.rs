mod core;
mod http;
mod log_payload;
pub(crate) mod schemas;

use std::sync::Arc;

use anyhow::Result;
use rmcp::ServiceExt;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::tools::Dispatcher;

pub(crate) use http::is_loopback;

pub use core::{N8nMcpCore, into_call_tool_result};
pub use http::{DEFAULT_HTTP_BIND_ADDRESS, McpHttpServer, RunningMcpHttpServer, resolve_bind_address};
pub use schemas::{CreateFromTemplateRequest, GetTemplateRequest, ListTemplatesRequest};

/// Serve MCP over stdin/stdout until the client disconnects or `shutdown` fires.
pub async fn serve_stdio(dispatcher: Arc<Dispatcher>, shutdown: CancellationToken) -> Result<()> {
    let running = N8nMcpCore::new(dispatcher).serve(rmcp::transport::stdio()).await?;
    info!("MCP stdio server ready");

    tokio::select! {
        quit = running.waiting() => {
            let reason = quit?;
            info!(?reason, "MCP stdio session ended");
        }
        _ = shutdown.cancelled() => {
            info!("MCP stdio server shutting down");
        }
    }
    Ok(())
}
