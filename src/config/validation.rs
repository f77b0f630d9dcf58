//! Configuration validation.
//!
//! Serde handles the syntax; this checks value ranges and URLs. Every problem
//! is reported, not just the first.

use std::fmt;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::ClientConfig;

/// Upper bound on `retries.max_attempts`.
pub const MAX_RETRY_ATTEMPTS: u32 = 10;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, returning every problem found.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&config.api.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            "api.base_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("api.base_url", e.to_string())),
    }

    if config.api.timeout_ms == 0 {
        errors.push(ValidationError::new("api.timeout_ms", "must be greater than zero"));
    }
    if config.api.client_version.trim().is_empty() {
        errors.push(ValidationError::new("api.client_version", "must not be empty"));
    }
    if config.api.platform.trim().is_empty() {
        errors.push(ValidationError::new("api.platform", "must not be empty"));
    }

    if config.retries.max_attempts > MAX_RETRY_ATTEMPTS {
        errors.push(ValidationError::new(
            "retries.max_attempts",
            format!("must be at most {MAX_RETRY_ATTEMPTS}"),
        ));
    }

    if config.circuit_breaker.enabled && config.circuit_breaker.cooldown_ms == 0 {
        errors.push(ValidationError::new(
            "circuit_breaker.cooldown_ms",
            "must be greater than zero",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
