//! Configuration validation.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::model::DEFAULT_TEMPLATES_DIR;
use crate::config::{ResolvedConfig, ServerConfig};
use crate::server::is_loopback;

/// Validate the configuration and produce the settings the server runs with.
pub fn validate_config(config: &ServerConfig) -> Result<ResolvedConfig, ValidationError> {
    let base_url = required(config.n8n.base_url.as_deref(), "n8n.baseUrl", "N8N_BASE_URL")?;
    validate_base_url(base_url)?;
    let api_key = required(config.n8n.api_key.as_deref(), "n8n.apiKey", "N8N_API_KEY")?;

    if let Some(address) = config.http_server.bind_address.as_deref() {
        validate_bind_address(address)?;
    }

    let resolved = ResolvedConfig {
        base_url: base_url.trim_end_matches('/').to_string(),
        api_key: api_key.to_string(),
        templates_dir: config
            .templates
            .directory
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATES_DIR)),
        http_bind_address: config.http_server.bind_address.clone(),
    };
    debug!(base_url = %resolved.base_url, templates_dir = %resolved.templates_dir.display(), "validated configuration");
    Ok(resolved)
}

fn required<'a>(value: Option<&'a str>, field: &str, env: &str) -> Result<&'a str, ValidationError> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ValidationError::MissingRequiredField {
            field: field.to_string(),
            env: env.to_string(),
        })
}

/// Validate the n8n base URL: http or https with a host.
pub fn validate_base_url(base_url: &str) -> Result<(), ValidationError> {
    let invalid = |reason: String| ValidationError::InvalidBaseUrl {
        url: base_url.to_string(),
        reason,
    };

    let url = Url::parse(base_url).map_err(|error| invalid(error.to_string()))?;
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(invalid(format!("Unsupported URL scheme: {scheme} (expected http/https)")));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("URL must include a host".to_string()));
    }
    Ok(())
}

/// Validate the HTTP transport bind address.
pub fn validate_bind_address(address: &str) -> Result<(), ValidationError> {
    let parsed: SocketAddr = address.parse().map_err(|error: std::net::AddrParseError| ValidationError::InvalidBindAddress {
        address: address.to_string(),
        reason: error.to_string(),
    })?;
    if !is_loopback(parsed.ip()) {
        return Err(ValidationError::InvalidBindAddress {
            address: address.to_string(),
            reason: "the MCP HTTP server must bind to a loopback address".to_string(),
        });
    }
    Ok(())
}

/// Errors that can occur during validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required setting '{field}' (set it in the config file or via {env})")]
    MissingRequiredField { field: String, env: String },

    #[error("Invalid n8n base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Invalid HTTP bind address '{address}': {reason}")]
    InvalidBindAddress { address: String, reason: String },
}
