use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{ToolInvocation, ToolRegistry, ToolResult};

/// Routes invocations to registered handlers.
///
/// Invocations run one at a time: the gate is held from lookup until the handler finishes, so
/// concurrent callers (several HTTP sessions, for example) are queued rather than interleaved.
/// Handler errors and panics are converted into [`ToolResult::Error`] and never escape.
#[derive(Debug)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    gate: Mutex<()>,
}

impl Dispatcher {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            gate: Mutex::new(()),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub async fn dispatch(&self, invocation: ToolInvocation) -> ToolResult {
        let _turn = self.gate.lock().await;

        let Some(tool) = self.registry.get(&invocation.name) else {
            warn!(tool = %invocation.name, "unknown tool requested");
            return ToolResult::Error(format!("Unknown tool: {}", invocation.name));
        };

        debug!(tool = %invocation.name, "dispatching tool call");
        let call = tool.handler.call(&invocation.arguments);
        match AssertUnwindSafe(call).catch_unwind().await {
            Ok(Ok(result)) => result,
            Ok(Err(error)) => {
                warn!(tool = %invocation.name, %error, "tool call failed");
                ToolResult::Error(format!("Error: {error}"))
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                warn!(tool = %invocation.name, %message, "tool handler panicked");
                ToolResult::Error(format!("Error: {message}"))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "tool handler panicked".to_string()
}
