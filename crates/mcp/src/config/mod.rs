//! Configuration management for the n8n MCP server.
//! This module handles parsing, interpolation, environment overrides and
//! validation of the ~/.config/n8n-mcp/config.json configuration file.

mod interpolation;
mod io;
mod model;
mod validation;

pub use interpolation::{InterpolationError, interpolate_config, interpolate_string};
pub use io::{
    API_KEY_ENV, BASE_URL_ENV, CONFIG_PATH_ENV, TEMPLATES_DIR_ENV, apply_env_overrides, default_config_path, load_config,
    load_config_from_path, resolve_config,
};
pub use model::{
    ConfigError, DEFAULT_TEMPLATES_DIR, HttpServerConfig, N8nConnectionConfig, ResolvedConfig, ServerConfig, TemplatesConfig,
};
pub use validation::{ValidationError, validate_base_url, validate_bind_address, validate_config};
