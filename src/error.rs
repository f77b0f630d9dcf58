//! Client error taxonomy and user-facing messages.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::ConfigError;

pub const MSG_CIRCUIT_OPEN: &str = "Circuit breaker is open for this endpoint";
pub const MSG_RATE_LIMITED: &str = "Rate limit exceeded. Please try again later.";
pub const MSG_SERVICE_UNAVAILABLE: &str =
    "Service temporarily unavailable. Please try again later.";
pub const MSG_NETWORK: &str = "Network error. Please check your connection and try again.";
pub const MSG_UNEXPECTED: &str = "An unexpected error occurred.";

/// Message shown for a 429 response.
pub fn too_many_requests_message(retry_after: &str) -> String {
    format!("Too many requests. Please try again in {retry_after} seconds.")
}

/// Status-code-to-message table. Statuses without an entry use the server's
/// `message` field, then the generic fallback.
pub fn message_for_status(status: u16, server_message: Option<&str>) -> String {
    let fixed = match status {
        400 => "Invalid request. Please check your input.",
        403 => "Access denied. You don't have permission for this action.",
        404 => "Resource not found.",
        409 => "Conflict. The resource already exists or is in use.",
        422 => "Validation failed. Please check your input.",
        _ => {
            return server_message
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .unwrap_or(MSG_UNEXPECTED)
                .to_string()
        }
    };
    fixed.to_string()
}

/// Coarse classification callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Short-circuited locally; the network was never touched.
    CircuitOpen,
    /// Suppressed locally until the server's reset time.
    RateLimited,
    AuthExpired,
    ServerUnavailable,
    Validation,
    Permission,
    NotFound,
    Conflict,
    TooManyRequests,
    Network,
    UnknownHttp,
    /// Configuration, I/O, or decoding failure inside the client.
    Local,
}

impl ErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => ErrorKind::Validation,
            401 => ErrorKind::AuthExpired,
            403 => ErrorKind::Permission,
            404 => ErrorKind::NotFound,
            409 => ErrorKind::Conflict,
            429 => ErrorKind::TooManyRequests,
            s if s >= 500 => ErrorKind::ServerUnavailable,
            _ => ErrorKind::UnknownHttp,
        }
    }

    /// Gating errors never reach the network.
    pub fn is_gated(self) -> bool {
        matches!(self, ErrorKind::CircuitOpen | ErrorKind::RateLimited)
    }
}

/// A non-2xx response that was not recovered.
#[derive(Debug)]
pub struct HttpError {
    pub status: u16,
    pub endpoint: String,
    pub request_id: String,
    pub message: String,
    /// `details` (or `errors`) from the response body.
    pub details: Option<Value>,
    /// Seconds from `retry-after`, when the server sent one.
    pub retry_after: Option<u64>,
}

/// Errors surfaced by [`crate::ApiClient`].
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("circuit breaker is open for {endpoint}")]
    CircuitOpen {
        endpoint: String,
        request_id: String,
        retry_in: Duration,
    },

    #[error("rate limit active for {endpoint}")]
    RateLimited {
        endpoint: String,
        request_id: String,
        retry_in: Duration,
    },

    #[error("authentication expired for {endpoint}")]
    AuthExpired {
        endpoint: String,
        request_id: String,
        message: String,
    },

    #[error("network error on {endpoint} after {attempts} attempt(s): {source}")]
    Network {
        endpoint: String,
        request_id: String,
        attempts: u32,
        message: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {} from {}", .0.status, .0.endpoint)]
    Http(Box<HttpError>),

    #[error("failed to decode response body: {source}")]
    Decode {
        request_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for client operations.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::CircuitOpen { .. } => ErrorKind::CircuitOpen,
            ApiError::RateLimited { .. } => ErrorKind::RateLimited,
            ApiError::AuthExpired { .. } => ErrorKind::AuthExpired,
            ApiError::Network { .. } => ErrorKind::Network,
            ApiError::Http(e) => ErrorKind::from_status(e.status),
            ApiError::Decode { .. }
            | ApiError::InvalidRequest(_)
            | ApiError::Io(_)
            | ApiError::Client(_)
            | ApiError::Config(_) => ErrorKind::Local,
        }
    }

    /// Human-readable message suitable for rendering as-is.
    pub fn user_message(&self) -> &str {
        match self {
            ApiError::CircuitOpen { .. } => MSG_CIRCUIT_OPEN,
            ApiError::RateLimited { .. } => MSG_RATE_LIMITED,
            ApiError::AuthExpired { message, .. } | ApiError::Network { message, .. } => message,
            ApiError::Http(e) => &e.message,
            _ => MSG_UNEXPECTED,
        }
    }

    /// HTTP status of the response that caused the error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::AuthExpired { .. } => Some(401),
            ApiError::Http(e) => Some(e.status),
            _ => None,
        }
    }

    pub fn request_id(&self) -> Option<&str> {
        match self {
            ApiError::CircuitOpen { request_id, .. }
            | ApiError::RateLimited { request_id, .. }
            | ApiError::AuthExpired { request_id, .. }
            | ApiError::Network { request_id, .. }
            | ApiError::Decode { request_id, .. } => Some(request_id),
            ApiError::Http(e) => Some(&e.request_id),
            _ => None,
        }
    }

    pub fn details(&self) -> Option<&Value> {
        match self {
            ApiError::Http(e) => e.details.as_ref(),
            _ => None,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            message: self.user_message().to_string(),
            details: self.details().cloned(),
            code: self
                .status()
                .map(ErrorCode::Status)
                .unwrap_or(ErrorCode::Unknown("UNKNOWN")),
            kind: self.kind(),
            request_id: self.request_id().unwrap_or("unknown").to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// HTTP status, or `"UNKNOWN"` when no response was involved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Status(u16),
    Unknown(&'static str),
}

/// Serializable view of an [`ApiError`] for display or logging.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub message: String,
    pub details: Option<Value>,
    pub code: ErrorCode,
    pub kind: ErrorKind,
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}
