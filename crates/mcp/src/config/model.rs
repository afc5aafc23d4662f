//! Data models for server configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ValidationError;
use crate::config::interpolation::InterpolationError;

/// Template directory used when neither the config file nor the environment names one.
pub const DEFAULT_TEMPLATES_DIR: &str = "templates";

/// On-disk configuration. Every field is optional so that the environment can fill gaps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default)]
    pub n8n: N8nConnectionConfig,
    #[serde(default)]
    pub templates: TemplatesConfig,
    #[serde(default)]
    pub http_server: HttpServerConfig,
}

/// Connection to the n8n instance.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct N8nConnectionConfig {
    /// Instance URL without the `/api/v1` suffix (supports `${env:NAME}`).
    pub base_url: Option<String>,
    /// API key sent as `X-N8N-API-KEY` (supports `${env:NAME}`).
    pub api_key: Option<String>,
}

impl std::fmt::Debug for N8nConnectionConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("N8nConnectionConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TemplatesConfig {
    /// Directory holding `templates-metadata.json` and the workflow documents.
    pub directory: Option<PathBuf>,
}

/// Configuration for the optional streamable HTTP transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HttpServerConfig {
    /// Loopback bind address, for example "127.0.0.1:62889".
    pub bind_address: Option<String>,
}

/// Fully validated settings the server runs with.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub api_key: String,
    pub templates_dir: PathBuf,
    pub http_bind_address: Option<String>,
}

impl std::fmt::Debug for ResolvedConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ResolvedConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("templates_dir", &self.templates_dir)
            .field("http_bind_address", &self.http_bind_address)
            .finish()
    }
}

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Interpolation error: {0}")]
    Interpolation(#[from] InterpolationError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}
