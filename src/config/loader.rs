//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::env::backend_url_from_env;
use crate::config::schema::EdgeConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, resolve and validate configuration.
///
/// Without a path the built-in defaults are used. The backend URL is always
/// resolved against the environment.
pub fn load_config(path: Option<&Path>) -> Result<EdgeConfig, ConfigError> {
    let config = match path {
        Some(path) => parse_config(&fs::read_to_string(path)?)?,
        None => EdgeConfig::default(),
    };
    finalize(config)
}

/// Parse a TOML document without touching the environment.
pub fn parse_config(content: &str) -> Result<EdgeConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Apply environment overrides, normalize and validate.
pub fn finalize(mut config: EdgeConfig) -> Result<EdgeConfig, ConfigError> {
    config.backend.base_url = Some(backend_url_from_env(config.backend.base_url.as_deref()));
    if let Some(origin) = config.pages.origin_url.take() {
        config.pages.origin_url = Some(origin.trim_end_matches('/').to_string());
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
