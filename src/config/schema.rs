//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the job portal client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend location and request defaults.
    pub api: ApiConfig,

    /// Network-failure retry settings.
    pub retries: RetryConfig,

    /// Per-endpoint circuit breaker settings.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Client-side rate-limit suppression settings.
    pub rate_limit: RateLimitConfig,

    /// Durable credential storage.
    pub session: SessionConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Backend API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every endpoint path is joined onto.
    pub base_url: String,

    /// Request timeout in milliseconds.
    pub timeout_ms: u64,

    /// Sent as `X-Client-Version`.
    pub client_version: String,

    /// Sent as `X-Client-Platform`.
    pub platform: String,

    /// Optional CSRF token sent as `X-CSRF-TOKEN`.
    pub csrf_token: Option<String>,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            timeout_ms: 15_000,
            client_version: "1.0.0".to_string(),
            platform: "web".to_string(),
            csrf_token: None,
        }
    }
}

/// Retry configuration for calls that got no response.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Enable retries.
    pub enabled: bool,

    /// Maximum number of retry attempts after the first failure.
    pub max_attempts: u32,

    /// Base delay in milliseconds; attempt `n` waits `n * base_delay_ms`.
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Enable the circuit breaker.
    pub enabled: bool,

    /// How long an endpoint stays short-circuited after a server error.
    pub cooldown_ms: u64,
}

impl CircuitBreakerConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cooldown_ms: 30_000,
        }
    }
}

/// Rate limit configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Honour `x-ratelimit-reset` from 429 responses.
    pub enabled: bool,

    /// Seconds quoted to the user when a 429 carries no `retry-after`.
    pub default_retry_after_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_retry_after_secs: 60,
        }
    }
}

/// Session storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SessionConfig {
    /// JSON file holding the tokens and user profile. In-memory when unset.
    pub path: Option<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9091".to_string(),
        }
    }
}
