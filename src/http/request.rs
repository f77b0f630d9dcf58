//! Outbound request types.
//!
//! # Responsibilities
//! - Generate the per-call correlation ID
//! - Hold everything needed to (re)build a request for each attempt
//! - Derive the endpoint key resilience state is stored under
//!
//! # Design Decisions
//! - Request ID created once per logical call; retries reuse it
//! - Bodies are kept as owned values so every attempt sends the same bytes

use std::path::Path;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

pub const X_REQUEST_ID: &str = "x-request-id";
pub const X_CLIENT_VERSION: &str = "x-client-version";
pub const X_CLIENT_PLATFORM: &str = "x-client-platform";
pub const X_CSRF_TOKEN: &str = "x-csrf-token";
pub const X_CACHE_STATUS: &str = "x-cache-status";
pub const X_RATELIMIT_LIMIT: &str = "x-ratelimit-limit";
pub const X_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";
pub const X_RATELIMIT_RESET: &str = "x-ratelimit-reset";
pub const RETRY_AFTER: &str = "retry-after";

/// Generate a correlation ID for one logical call.
pub fn generate_request_id() -> String {
    format!("req_{}", Uuid::new_v4().simple())
}

/// Resilience key for a request target: the path without its query string.
pub fn endpoint_key(target: &str) -> String {
    let path = target.split(['?', '#']).next().unwrap_or_default();
    let path = path.trim_end_matches('/');
    if path.is_empty() {
        "/".to_string()
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Per-call bookkeeping, alive from dispatch to completion.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: String,
    endpoint: String,
    method: Method,
    start: Instant,
    retried: bool,
    attempts: u32,
}

impl RequestContext {
    pub fn new(method: Method, target: &str) -> Self {
        Self {
            request_id: generate_request_id(),
            endpoint: endpoint_key(target),
            method,
            start: Instant::now(),
            retried: false,
            attempts: 0,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn start(&self) -> Instant {
        self.start
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Whether the call has already used its one recovery (refresh or
    /// network retry).
    pub fn retried(&self) -> bool {
        self.retried
    }

    pub fn mark_retried(&mut self) {
        self.retried = true;
    }

    /// Dispatches made so far, including the first.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub(crate) fn record_attempt(&mut self) {
        self.attempts += 1;
    }
}

/// A file sent as one multipart field.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl FilePart {
    /// Read `path` into memory, guessing the MIME type from its extension.
    pub fn from_path(field: &str, path: &Path) -> ApiResult<Self> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ApiError::InvalidRequest(format!("'{}' has no file name", path.display())))?
            .to_string();
        let bytes = std::fs::read(path)?;
        Ok(Self {
            field: field.to_string(),
            mime: mime_for(&file_name).to_string(),
            file_name,
            bytes,
        })
    }

    fn to_form(&self) -> ApiResult<Form> {
        let part = Part::bytes(self.bytes.clone())
            .file_name(self.file_name.clone())
            .mime_str(&self.mime)
            .map_err(|e| ApiError::InvalidRequest(format!("invalid MIME type '{}': {e}", self.mime)))?;
        Ok(Form::new().part(self.field.clone(), part))
    }
}

/// MIME type for the resume formats the backend accepts.
pub fn mime_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Request payload.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(FilePart),
}

impl RequestBody {
    pub fn is_multipart(&self) -> bool {
        matches!(self, RequestBody::Multipart(_))
    }
}

/// A request as it flows through the hooks, rebuilt for each attempt.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub method: Method,
    /// Path plus query, relative to the configured base URL.
    pub target: String,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

impl PendingRequest {
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(target: impl Into<String>) -> Self {
        Self::new(Method::GET, target)
    }

    pub fn post(target: impl Into<String>) -> Self {
        Self::new(Method::POST, target)
    }

    pub fn put(target: impl Into<String>) -> Self {
        Self::new(Method::PUT, target)
    }

    pub fn delete(target: impl Into<String>) -> Self {
        Self::new(Method::DELETE, target)
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn with_file(mut self, file: FilePart) -> Self {
        self.body = RequestBody::Multipart(file);
        self
    }

    /// Set a header, replacing any previous value.
    pub fn set_header(&mut self, name: &'static str, value: &str) -> ApiResult<()> {
        let value = HeaderValue::from_str(value)
            .map_err(|_| ApiError::InvalidRequest(format!("invalid value for header '{name}'")))?;
        self.headers.insert(HeaderName::from_static(name), value);
        Ok(())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Attach the body to a reqwest builder.
    pub(crate) fn apply_body(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> ApiResult<reqwest::RequestBuilder> {
        Ok(match &self.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(file) => builder.multipart(file.to_form()?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_unique() {
        let a = generate_request_id();
        let b = generate_request_id();
        assert!(a.starts_with("req_"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_endpoint_key_strips_query() {
        assert_eq!(endpoint_key("/jobs?page=0&size=10"), "/jobs");
        assert_eq!(endpoint_key("/jobs/42"), "/jobs/42");
        assert_eq!(endpoint_key("jobs/42/"), "/jobs/42");
        assert_eq!(endpoint_key("/jobs/search?keyword=rust#top"), "/jobs/search");
        assert_eq!(endpoint_key(""), "/");
    }

    #[test]
    fn test_context_flags() {
        let mut ctx = RequestContext::new(Method::GET, "/jobs?page=1");
        assert_eq!(ctx.endpoint(), "/jobs");
        assert!(!ctx.retried());
        ctx.mark_retried();
        ctx.record_attempt();
        assert!(ctx.retried());
        assert_eq!(ctx.attempts(), 1);
    }

    #[test]
    fn test_mime_for() {
        assert_eq!(mime_for("resume.PDF"), "application/pdf");
        assert_eq!(mime_for("cv.docx"), "application/vnd.openxmlformats-officedocument.wordprocessingml.document");
        assert_eq!(mime_for("photo.png"), "application/octet-stream");
        assert_eq!(mime_for("README"), "application/octet-stream");
    }

    #[test]
    fn test_set_header_rejects_invalid_value() {
        let mut req = PendingRequest::get("/jobs");
        assert!(req.set_header(X_CSRF_TOKEN, "line\nbreak").is_err());
        req.set_header(X_CSRF_TOKEN, "abc").unwrap();
        assert_eq!(req.header(X_CSRF_TOKEN), Some("abc"));
    }
}
