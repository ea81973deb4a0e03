//! Configuration loading from disk and environment.

use std::env;
use std::fs;
use std::path::Path;

use crate::config::schema::ExplainerConfig;
use crate::config::validation::{validate_config, ConfigViolation};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, value: String },
    Validation(Vec<ConfigViolation>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, value } => {
                write!(f, "Invalid value '{}' for environment variable {}", value, var)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration from an optional TOML file, apply environment
/// overrides, and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<ExplainerConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_file(path)?,
        None => ExplainerConfig::default(),
    };

    apply_env_overrides(&mut config, |key| env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn parse_file(path: &Path) -> Result<ExplainerConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Overlay `EXPLAINER_*` variables on top of a parsed config.
///
/// `lookup` abstracts the environment so overrides can be tested without
/// touching process state.
pub fn apply_env_overrides<F>(config: &mut ExplainerConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("EXPLAINER_BIND_ADDRESS") {
        config.listener.bind_address = v;
    }
    if let Some(v) = lookup("EXPLAINER_BACKEND_URL") {
        config.backend.endpoint = v;
    }
    if let Some(v) = lookup("EXPLAINER_MODEL") {
        config.backend.model = v;
    }
    if let Some(v) = lookup("EXPLAINER_RATE_LIMIT") {
        config.rate_limit.requests_per_window = v.trim().parse().map_err(|_| ConfigError::Env {
            var: "EXPLAINER_RATE_LIMIT",
            value: v.clone(),
        })?;
    }
    if let Some(v) = lookup("EXPLAINER_CORS_ORIGINS") {
        config.cors.allowed_origins = split_list(&v);
    }
    if let Some(v) = lookup("EXPLAINER_LANGUAGES") {
        config.request.supported_languages = split_list(&v);
    }
    if let Some(v) = lookup("EXPLAINER_LOG_LEVEL") {
        config.observability.log_level = v;
    }
    Ok(())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
