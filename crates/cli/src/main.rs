use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use n8n_mcp_api::N8nClient;
use n8n_mcp_server::config::{ServerConfig, load_config, load_config_from_path, validate_config};
use n8n_mcp_server::server::{McpHttpServer, resolve_bind_address, serve_stdio};
use n8n_mcp_server::{Dispatcher, build_registry};
use n8n_mcp_templates::{FsTemplateStore, TemplateCatalog};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = cli.load_config()?;
    let resolved = validate_config(&config).context("invalid configuration")?;

    let store = Arc::new(FsTemplateStore::new(&resolved.templates_dir));
    let catalog = Arc::new(TemplateCatalog::load(store.as_ref()).await);
    if catalog.is_empty() {
        warn!(directory = %resolved.templates_dir.display(), "no workflow templates available");
    }

    let client = N8nClient::new(&resolved.base_url, &resolved.api_key).context("failed to create n8n client")?;
    let dispatcher = Arc::new(Dispatcher::new(build_registry(catalog, store, Arc::new(client))));
    info!(tools = dispatcher.registry().len(), base_url = %resolved.base_url, "n8n MCP server initialized");

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("received interrupt, shutting down");
            }
            shutdown.cancel();
        }
    });

    if cli.http.is_some() {
        let address = resolve_bind_address(resolved.http_bind_address.as_deref())?;
        let running = McpHttpServer::new(address, dispatcher).start().await?;
        shutdown.cancelled().await;
        running.stop().await
    } else {
        serve_stdio(dispatcher, shutdown).await
    }
}

/// Logs go to stderr: stdout carries the stdio transport.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

/// MCP server for n8n workflow automation.
#[derive(Debug, Parser)]
#[command(name = "n8n-mcp", version, about)]
struct Cli {
    /// Path to the configuration file (defaults to N8N_MCP_CONFIG_PATH or ~/.config/n8n-mcp/config.json).
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Directory containing templates-metadata.json and the workflow documents.
    #[arg(long)]
    templates_dir: Option<PathBuf>,

    /// Serve the streamable HTTP transport instead of stdio, optionally on a loopback ADDR
    /// (default 127.0.0.1:62889).
    #[arg(long, value_name = "ADDR", num_args = 0..=1)]
    http: Option<Option<String>>,
}

impl Cli {
    fn load_config(&self) -> Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => load_config_from_path(path)?,
            None => load_config()?,
        };
        if let Some(directory) = &self.templates_dir {
            config.templates.directory = Some(directory.clone());
        }
        if let Some(Some(address)) = &self.http {
            config.http_server.bind_address = Some(address.clone());
        }
        Ok(config)
    }
}
