//! Ordered hooks around every dispatch.
//!
//! # Data Flow
//! ```text
//! PendingRequest
//!     → GateHook (circuit, then rate limit; may refuse)
//!     → HeaderHook (content type, client version/platform, request ID)
//!     → CredentialsHook (bearer token, CSRF token)
//!     → transport
//!     → CircuitHook (close on 2xx, open on 5xx)
//!     → RateLimitHook (record 429 reset)
//!     → MetricsHook
//! ```
//!
//! # Design Decisions
//! - Hooks are synchronous; nothing in them waits on I/O
//! - Pre hooks may fail the call, post hooks only observe it

use std::sync::Arc;

use reqwest::StatusCode;

use crate::auth::SessionStore;
use crate::error::{ApiError, ApiResult};
use crate::http::request::{
    PendingRequest, RequestContext, X_CLIENT_PLATFORM, X_CLIENT_VERSION, X_CSRF_TOKEN,
    X_RATELIMIT_RESET, X_REQUEST_ID,
};
use crate::http::response::RawResponse;
use crate::observability::metrics;
use crate::resilience::rate_limit::parse_reset_header;
use crate::resilience::{GateRejection, RequestManager};

const CONTENT_TYPE: &str = "content-type";
const AUTHORIZATION: &str = "authorization";

/// What a single dispatch produced.
#[derive(Debug)]
pub enum DispatchOutcome {
    Response(RawResponse),
    /// No HTTP response arrived.
    Failed(reqwest::Error),
}

impl DispatchOutcome {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            DispatchOutcome::Response(raw) => Some(raw.status),
            DispatchOutcome::Failed(_) => None,
        }
    }
}

/// Runs before the request is sent. An error aborts the call without
/// touching the network.
pub trait PreDispatchHook: Send + Sync {
    fn name(&self) -> &'static str;

    fn before(&self, ctx: &RequestContext, request: &mut PendingRequest) -> ApiResult<()>;
}

/// Runs after every dispatch, including retries and the refresh call.
pub trait PostDispatchHook: Send + Sync {
    fn name(&self) -> &'static str;

    fn after(&self, ctx: &RequestContext, outcome: &DispatchOutcome);
}

/// Refuses calls to endpoints with an open circuit or an active rate limit.
pub struct GateHook {
    manager: Arc<RequestManager>,
}

impl GateHook {
    pub fn new(manager: Arc<RequestManager>) -> Self {
        Self { manager }
    }
}

impl PreDispatchHook for GateHook {
    fn name(&self) -> &'static str {
        "gate"
    }

    fn before(&self, ctx: &RequestContext, _request: &mut PendingRequest) -> ApiResult<()> {
        match self.manager.check(ctx.endpoint()) {
            Ok(()) => Ok(()),
            Err(GateRejection::CircuitOpen { retry_in }) => Err(ApiError::CircuitOpen {
                endpoint: ctx.endpoint().to_string(),
                request_id: ctx.request_id().to_string(),
                retry_in,
            }),
            Err(GateRejection::RateLimited { retry_in }) => Err(ApiError::RateLimited {
                endpoint: ctx.endpoint().to_string(),
                request_id: ctx.request_id().to_string(),
                retry_in,
            }),
        }
    }
}

/// Adds the headers every request carries.
pub struct HeaderHook {
    client_version: String,
    platform: String,
}

impl HeaderHook {
    pub fn new(client_version: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            client_version: client_version.into(),
            platform: platform.into(),
        }
    }
}

impl PreDispatchHook for HeaderHook {
    fn name(&self) -> &'static str {
        "headers"
    }

    fn before(&self, ctx: &RequestContext, request: &mut PendingRequest) -> ApiResult<()> {
        // multipart sets its own content type with the boundary
        if !request.body.is_multipart() {
            request.set_header(CONTENT_TYPE, "application/json")?;
        }
        request.set_header(X_CLIENT_VERSION, &self.client_version)?;
        request.set_header(X_CLIENT_PLATFORM, &self.platform)?;
        request.set_header(X_REQUEST_ID, ctx.request_id())
    }
}

/// Adds the bearer token from the session and the configured CSRF token.
pub struct CredentialsHook {
    session: Arc<dyn SessionStore>,
    csrf_token: Option<String>,
}

impl CredentialsHook {
    pub fn new(session: Arc<dyn SessionStore>, csrf_token: Option<String>) -> Self {
        Self {
            session,
            csrf_token: csrf_token.filter(|t| !t.trim().is_empty()),
        }
    }
}

impl PreDispatchHook for CredentialsHook {
    fn name(&self) -> &'static str {
        "credentials"
    }

    fn before(&self, _ctx: &RequestContext, request: &mut PendingRequest) -> ApiResult<()> {
        if let Some(token) = self.session.access_token() {
            request.set_header(AUTHORIZATION, &format!("Bearer {token}"))?;
        }
        if let Some(csrf) = &self.csrf_token {
            request.set_header(X_CSRF_TOKEN, csrf)?;
        }
        Ok(())
    }
}

/// Closes the circuit on success and opens it on a server error.
pub struct CircuitHook {
    manager: Arc<RequestManager>,
}

impl CircuitHook {
    pub fn new(manager: Arc<RequestManager>) -> Self {
        Self { manager }
    }
}

impl PostDispatchHook for CircuitHook {
    fn name(&self) -> &'static str {
        "circuit"
    }

    fn after(&self, ctx: &RequestContext, outcome: &DispatchOutcome) {
        match outcome.status() {
            Some(status) if status.is_success() => self.manager.record_success(ctx.endpoint()),
            Some(status) if status.is_server_error() => {
                self.manager.record_server_error(ctx.endpoint())
            }
            _ => {}
        }
    }
}

/// Remembers the reset time the server announced with a 429.
pub struct RateLimitHook {
    manager: Arc<RequestManager>,
}

impl RateLimitHook {
    pub fn new(manager: Arc<RequestManager>) -> Self {
        Self { manager }
    }
}

impl PostDispatchHook for RateLimitHook {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    fn after(&self, ctx: &RequestContext, outcome: &DispatchOutcome) {
        let DispatchOutcome::Response(raw) = outcome else {
            return;
        };
        if raw.status != StatusCode::TOO_MANY_REQUESTS {
            return;
        }
        match raw.header(X_RATELIMIT_RESET).and_then(parse_reset_header) {
            Some(reset) => self.manager.record_rate_limit(ctx.endpoint(), reset),
            None => tracing::debug!(
                request_id = %ctx.request_id(),
                endpoint = %ctx.endpoint(),
                "429 without a usable reset header"
            ),
        }
    }
}

/// Counts dispatches and their latency.
pub struct MetricsHook;

impl PostDispatchHook for MetricsHook {
    fn name(&self) -> &'static str {
        "metrics"
    }

    fn after(&self, ctx: &RequestContext, outcome: &DispatchOutcome) {
        let status = outcome.status().map(|s| s.as_u16()).unwrap_or(0);
        metrics::record_request(ctx.method().as_str(), status, ctx.start());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MemorySessionStore, Session};
    use crate::http::request::FilePart;
    use bytes::Bytes;
    use reqwest::header::{HeaderMap, HeaderValue};
    use reqwest::Method;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn response(status: u16, headers: &[(&'static str, String)]) -> DispatchOutcome {
        let mut map = HeaderMap::new();
        for (k, v) in headers {
            map.insert(*k, HeaderValue::from_str(v).unwrap());
        }
        DispatchOutcome::Response(RawResponse {
            status: StatusCode::from_u16(status).unwrap(),
            headers: map,
            body: Bytes::new(),
        })
    }

    #[test]
    fn test_gate_refuses_open_circuit() {
        let manager = Arc::new(RequestManager::default());
        manager.record_server_error("/jobs");
        let hook = GateHook::new(manager);

        let ctx = RequestContext::new(Method::GET, "/jobs?page=0");
        let err = hook
            .before(&ctx, &mut PendingRequest::get("/jobs?page=0"))
            .unwrap_err();
        assert!(matches!(err, ApiError::CircuitOpen { .. }));
        assert_eq!(err.request_id(), Some(ctx.request_id()));

        let other = RequestContext::new(Method::GET, "/applications/my");
        assert!(hook
            .before(&other, &mut PendingRequest::get("/applications/my"))
            .is_ok());
    }

    #[test]
    fn test_standard_headers() {
        let hook = HeaderHook::new("2.1.0", "web");
        let ctx = RequestContext::new(Method::GET, "/jobs");
        let mut request = PendingRequest::get("/jobs");
        hook.before(&ctx, &mut request).unwrap();

        assert_eq!(request.header(CONTENT_TYPE), Some("application/json"));
        assert_eq!(request.header(X_CLIENT_VERSION), Some("2.1.0"));
        assert_eq!(request.header(X_CLIENT_PLATFORM), Some("web"));
        assert_eq!(request.header(X_REQUEST_ID), Some(ctx.request_id()));

        let mut upload = PendingRequest::post("/files/upload").with_file(FilePart {
            field: "file".into(),
            file_name: "cv.pdf".into(),
            mime: "application/pdf".into(),
            bytes: vec![1, 2, 3],
        });
        hook.before(&ctx, &mut upload).unwrap();
        assert_eq!(upload.header(CONTENT_TYPE), None);
    }

    #[test]
    fn test_credentials_skip_placeholder_tokens() {
        let store = Arc::new(MemorySessionStore::with_session(Session {
            access_token: Some("undefined".into()),
            ..Session::default()
        }));
        let hook = CredentialsHook::new(store.clone(), Some("csrf-1".into()));
        let ctx = RequestContext::new(Method::GET, "/auth/me");

        let mut request = PendingRequest::get("/auth/me");
        hook.before(&ctx, &mut request).unwrap();
        assert_eq!(request.header(AUTHORIZATION), None);
        assert_eq!(request.header(X_CSRF_TOKEN), Some("csrf-1"));

        store.set_access_token("tok");
        let mut request = PendingRequest::get("/auth/me");
        hook.before(&ctx, &mut request).unwrap();
        assert_eq!(request.header(AUTHORIZATION), Some("Bearer tok"));
    }

    #[test]
    fn test_circuit_hook_tracks_status() {
        let manager = Arc::new(RequestManager::default());
        let hook = CircuitHook::new(manager.clone());
        let ctx = RequestContext::new(Method::GET, "/jobs");

        hook.after(&ctx, &response(503, &[]));
        assert!(manager.circuits().is_open("/jobs"));
        hook.after(&ctx, &response(404, &[]));
        assert!(manager.circuits().is_open("/jobs"));
        hook.after(&ctx, &response(200, &[]));
        assert!(!manager.circuits().is_open("/jobs"));
    }

    #[test]
    fn test_rate_limit_hook_records_reset() {
        let manager = Arc::new(RequestManager::default());
        let hook = RateLimitHook::new(manager.clone());
        let ctx = RequestContext::new(Method::GET, "/jobs/search?keyword=rust");
        let reset = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() + 120;

        hook.after(&ctx, &response(429, &[]));
        assert!(!manager.rate_limits().is_limited("/jobs/search"));

        hook.after(&ctx, &response(429, &[(X_RATELIMIT_RESET, reset.to_string())]));
        assert!(manager.rate_limits().is_limited("/jobs/search"));
    }
}
