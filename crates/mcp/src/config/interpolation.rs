//! Configuration interpolation for environment variables.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

use crate::config::ServerConfig;

static ENV_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{env:([A-Za-z_][A-Za-z0-9_]*)\}").expect("env placeholder regex should compile"));

/// Errors that can occur during interpolation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InterpolationError {
    #[error("Missing environment variable: {name}")]
    MissingEnvVar { name: String },

    #[error("Value for '{field}' is not valid UTF-8")]
    NonUtf8 { field: String },
}

/// Replace `${env:NAME}` placeholders in every string field of the configuration.
pub fn interpolate_config(config: &mut ServerConfig) -> Result<(), InterpolationError> {
    interpolate_option(&mut config.n8n.base_url)?;
    interpolate_option(&mut config.n8n.api_key)?;
    interpolate_option(&mut config.http_server.bind_address)?;

    if let Some(directory) = config.templates.directory.as_mut() {
        let raw = directory.to_str().ok_or_else(|| InterpolationError::NonUtf8 {
            field: "templates.directory".to_string(),
        })?;
        *directory = PathBuf::from(interpolate_string(raw)?);
    }
    Ok(())
}

fn interpolate_option(value: &mut Option<String>) -> Result<(), InterpolationError> {
    if let Some(text) = value.as_mut() {
        *text = interpolate_string(text)?;
    }
    Ok(())
}

/// Interpolate a single string. An unset variable is an error rather than an empty value.
pub fn interpolate_string(value: &str) -> Result<String, InterpolationError> {
    let mut missing = None;
    let result = ENV_PLACEHOLDER.replace_all(value, |captures: &Captures<'_>| {
        let name = &captures[1];
        match std::env::var(name) {
            Ok(resolved) => {
                debug!("Interpolated env var: {} -> [REDACTED]", name);
                resolved
            }
            Err(_) => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(name) => Err(InterpolationError::MissingEnvVar { name }),
        None => Ok(result.into_owned()),
    }
}
