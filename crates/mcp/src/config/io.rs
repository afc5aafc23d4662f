//! Configuration IO helpers for the server configuration file.

use crate::config::{ConfigError, ResolvedConfig, ServerConfig, interpolate_config, validate_config};
use anyhow::Context;
use dirs_next::{config_dir, home_dir};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Overrides the location of the configuration file.
pub const CONFIG_PATH_ENV: &str = "N8N_MCP_CONFIG_PATH";
pub const BASE_URL_ENV: &str = "N8N_BASE_URL";
pub const API_KEY_ENV: &str = "N8N_API_KEY";
pub const TEMPLATES_DIR_ENV: &str = "N8N_TEMPLATES_DIR";

/// Returns the default path for the configuration file.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return expand_tilde(&path);
    }

    config_dir().unwrap_or_else(|| PathBuf::from(".")).join("n8n-mcp").join("config.json")
}

/// Loads configuration from the default path.
pub fn load_config() -> anyhow::Result<ServerConfig> {
    let path = default_config_path();
    load_config_from_path(&path)
}

/// Loads configuration from a specific path and layers environment overrides on top.
///
/// A missing file is not an error: the environment alone can supply every setting.
pub fn load_config_from_path(path: &Path) -> anyhow::Result<ServerConfig> {
    let mut config = if path.exists() {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ServerConfig = serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "loaded configuration file");
        config
    } else {
        debug!(path = %path.display(), "no configuration file, using environment only");
        ServerConfig::default()
    };

    interpolate_config(&mut config)
        .map_err(ConfigError::from)
        .with_context(|| format!("failed to interpolate '{}'", path.display()))?;
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Loads, interpolates, overrides and validates configuration in one step.
pub fn resolve_config(path: &Path) -> anyhow::Result<ResolvedConfig> {
    let config = load_config_from_path(path)?;
    let resolved = validate_config(&config).map_err(ConfigError::from)?;
    Ok(resolved)
}

/// Environment variables win over file values when set to a non-empty string.
pub fn apply_env_overrides(config: &mut ServerConfig) {
    if let Some(base_url) = non_empty_env(BASE_URL_ENV) {
        config.n8n.base_url = Some(base_url);
    }
    if let Some(api_key) = non_empty_env(API_KEY_ENV) {
        config.n8n.api_key = Some(api_key);
    }
    if let Some(directory) = non_empty_env(TEMPLATES_DIR_ENV) {
        config.templates.directory = Some(expand_tilde(&directory));
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}
