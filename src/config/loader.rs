//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::ClientConfig;
use crate::config::validation::{validate_config, ValidationError};

pub const ENV_API_URL: &str = "JOBPORTAL_API_URL";
pub const ENV_REQUEST_TIMEOUT: &str = "JOBPORTAL_REQUEST_TIMEOUT";
pub const ENV_CLIENT_VERSION: &str = "JOBPORTAL_CLIENT_VERSION";
pub const ENV_CSRF_TOKEN: &str = "JOBPORTAL_CSRF_TOKEN";
pub const ENV_SESSION_FILE: &str = "JOBPORTAL_SESSION_FILE";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
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

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Validation(_) => None,
        }
    }
}

/// Load a configuration: TOML file if given (defaults otherwise), then
/// process environment overrides, then validation.
pub fn load_config(path: Option<&Path>) -> Result<ClientConfig, ConfigError> {
    let config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => ClientConfig::default(),
    };

    finalize(config, |key| std::env::var(key).ok())
}

/// Apply overrides from `lookup` and validate the result.
pub fn finalize<F>(mut config: ClientConfig, lookup: F) -> Result<ClientConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut errors = apply_overrides(&mut config, lookup);
    if let Err(mut semantic) = validate_config(&config) {
        errors.append(&mut semantic);
    }

    if errors.is_empty() {
        Ok(config)
    } else {
        Err(ConfigError::Validation(errors))
    }
}

fn apply_overrides<F>(config: &mut ClientConfig, lookup: F) -> Vec<ValidationError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut errors = Vec::new();

    if let Some(url) = lookup(ENV_API_URL) {
        config.api.base_url = url;
    }
    if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT) {
        match raw.trim().parse::<u64>() {
            Ok(ms) => config.api.timeout_ms = ms,
            Err(_) => errors.push(ValidationError {
                field: "api.timeout_ms",
                message: format!("{ENV_REQUEST_TIMEOUT}='{raw}' is not a number of milliseconds"),
            }),
        }
    }
    if let Some(version) = lookup(ENV_CLIENT_VERSION) {
        config.api.client_version = version;
    }
    if let Some(token) = lookup(ENV_CSRF_TOKEN).filter(|t| !t.is_empty()) {
        config.api.csrf_token = Some(token);
    }
    if let Some(path) = lookup(ENV_SESSION_FILE).filter(|p| !p.is_empty()) {
        config.session.path = Some(path);
    }

    errors
}
