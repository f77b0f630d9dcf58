//! Resilient API client.
//!
//! # Responsibilities
//! - Run every call through the pre-dispatch hooks, the transport and the
//!   post-dispatch hooks
//! - Recover from an expired access token with one refresh and one re-send
//! - Retry calls that got no response, with linear backoff
//! - Turn every failure into an [`ApiError`] with a user-facing message
//!
//! # Design Decisions
//! - Recovery is an explicit bounded loop; the refresh call reuses the same
//!   dispatch path with a context that is already marked retried
//! - Server errors are not retried; they open the endpoint's circuit
//! - A call gets one recovery: either a token refresh or a run of network
//!   retries, never both

use std::sync::Arc;

use bytes::Bytes;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::broadcast;

use crate::auth::{
    FileSessionStore, MemorySessionStore, Session, SessionEvent, SessionEvents, SessionStore,
};
use crate::config::ClientConfig;
use crate::error::{
    message_for_status, too_many_requests_message, ApiError, ApiResult, HttpError,
    MSG_NETWORK, MSG_SERVICE_UNAVAILABLE, MSG_UNEXPECTED,
};
use crate::http::hooks::{
    CircuitHook, CredentialsHook, DispatchOutcome, GateHook, HeaderHook, MetricsHook,
    PostDispatchHook, PreDispatchHook, RateLimitHook,
};
use crate::http::request::{FilePart, PendingRequest, RequestContext, RETRY_AFTER};
use crate::http::response::{ApiResponse, RawResponse};
use crate::observability::metrics;
use crate::resilience::retries::is_retryable;
use crate::resilience::{RequestManager, RetryPolicy};

pub const REFRESH_PATH: &str = "/auth/refresh";

/// Tokens returned by the refresh endpoint, either at the top level or
/// inside `data`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshedTokens {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    data: Option<Box<RefreshedTokens>>,
}

impl RefreshedTokens {
    fn into_pair(self) -> Option<(String, Option<String>)> {
        if let Some(access) = self.access_token.filter(|t| !t.is_empty()) {
            return Some((access, self.refresh_token));
        }
        self.data.and_then(|inner| inner.into_pair())
    }
}

struct ClientInner {
    http: reqwest::Client,
    base_url: String,
    config: ClientConfig,
    retry: RetryPolicy,
    manager: Arc<RequestManager>,
    session: Arc<dyn SessionStore>,
    events: SessionEvents,
    pre_hooks: Vec<Arc<dyn PreDispatchHook>>,
    post_hooks: Vec<Arc<dyn PostDispatchHook>>,
}

/// HTTP client for the job portal API. Cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

/// Builder for [`ApiClient`].
pub struct ApiClientBuilder {
    config: ClientConfig,
    manager: Option<Arc<RequestManager>>,
    session: Option<Arc<dyn SessionStore>>,
    events: Option<SessionEvents>,
    pre_hooks: Vec<Arc<dyn PreDispatchHook>>,
    post_hooks: Vec<Arc<dyn PostDispatchHook>>,
}

impl ApiClientBuilder {
    /// Share breaker and rate-limit state with other clients.
    pub fn request_manager(mut self, manager: Arc<RequestManager>) -> Self {
        self.manager = Some(manager);
        self
    }

    pub fn session_store(mut self, session: Arc<dyn SessionStore>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn session_events(mut self, events: SessionEvents) -> Self {
        self.events = Some(events);
        self
    }

    /// Append a hook after the built-in gate, header and credential hooks.
    pub fn pre_hook(mut self, hook: Arc<dyn PreDispatchHook>) -> Self {
        self.pre_hooks.push(hook);
        self
    }

    /// Append a hook after the built-in circuit, rate-limit and metrics hooks.
    pub fn post_hook(mut self, hook: Arc<dyn PostDispatchHook>) -> Self {
        self.post_hooks.push(hook);
        self
    }

    pub fn build(self) -> ApiResult<ApiClient> {
        let config = self.config;
        let http = reqwest::Client::builder()
            .timeout(config.api.timeout())
            .build()
            .map_err(ApiError::Client)?;

        let manager = self.manager.unwrap_or_else(|| {
            Arc::new(RequestManager::new(
                &config.circuit_breaker,
                &config.rate_limit,
            ))
        });
        let session: Arc<dyn SessionStore> = match self.session {
            Some(session) => session,
            None => match &config.session.path {
                Some(path) => Arc::new(FileSessionStore::open(path)?),
                None => Arc::new(MemorySessionStore::new()),
            },
        };

        let mut pre_hooks: Vec<Arc<dyn PreDispatchHook>> = vec![
            Arc::new(GateHook::new(manager.clone())),
            Arc::new(HeaderHook::new(
                config.api.client_version.clone(),
                config.api.platform.clone(),
            )),
            Arc::new(CredentialsHook::new(
                session.clone(),
                config.api.csrf_token.clone(),
            )),
        ];
        pre_hooks.extend(self.pre_hooks);

        let mut post_hooks: Vec<Arc<dyn PostDispatchHook>> = vec![
            Arc::new(CircuitHook::new(manager.clone())),
            Arc::new(RateLimitHook::new(manager.clone())),
            Arc::new(MetricsHook),
        ];
        post_hooks.extend(self.post_hooks);

        tracing::debug!(
            base_url = %config.api.base_url,
            timeout_ms = config.api.timeout_ms,
            pre_hooks = ?pre_hooks.iter().map(|h| h.name()).collect::<Vec<_>>(),
            post_hooks = ?post_hooks.iter().map(|h| h.name()).collect::<Vec<_>>(),
            "API client built"
        );

        Ok(ApiClient {
            inner: Arc::new(ClientInner {
                http,
                base_url: config.api.base_url.trim_end_matches('/').to_string(),
                retry: RetryPolicy::from_config(&config.retries),
                config,
                manager,
                session,
                events: self.events.unwrap_or_default(),
                pre_hooks,
                post_hooks,
            }),
        })
    }
}

impl ApiClient {
    pub fn builder(config: ClientConfig) -> ApiClientBuilder {
        ApiClientBuilder {
            config,
            manager: None,
            session: None,
            events: None,
            pre_hooks: Vec::new(),
            post_hooks: Vec::new(),
        }
    }

    /// Client with default wiring for `config`.
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        Self::builder(config).build()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn request_manager(&self) -> &Arc<RequestManager> {
        &self.inner.manager
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.inner.session
    }

    pub fn session_events(&self) -> &SessionEvents {
        &self.inner.events
    }

    pub fn subscribe_session_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    pub async fn get(&self, target: &str) -> ApiResult<ApiResponse<Bytes>> {
        self.execute(PendingRequest::get(target)).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        target: &str,
        body: &B,
    ) -> ApiResult<ApiResponse<Bytes>> {
        self.execute(PendingRequest::post(target).with_json(to_json(body)?))
            .await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        target: &str,
        body: &B,
    ) -> ApiResult<ApiResponse<Bytes>> {
        self.execute(PendingRequest::put(target).with_json(to_json(body)?))
            .await
    }

    pub async fn delete(&self, target: &str) -> ApiResult<ApiResponse<Bytes>> {
        self.execute(PendingRequest::delete(target)).await
    }

    /// POST a single file as multipart form data.
    pub async fn upload(&self, target: &str, file: FilePart) -> ApiResult<ApiResponse<Bytes>> {
        self.execute(PendingRequest::post(target).with_file(file))
            .await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, target: &str) -> ApiResult<ApiResponse<T>> {
        self.get(target).await?.decode()
    }

    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        target: &str,
        body: &B,
    ) -> ApiResult<ApiResponse<T>> {
        self.post(target, body).await?.decode()
    }

    pub async fn put_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        target: &str,
        body: &B,
    ) -> ApiResult<ApiResponse<T>> {
        self.put(target, body).await?.decode()
    }

    pub async fn delete_json<T: DeserializeOwned>(
        &self,
        target: &str,
    ) -> ApiResult<ApiResponse<T>> {
        self.delete(target).await?.decode()
    }

    pub async fn upload_json<T: DeserializeOwned>(
        &self,
        target: &str,
        file: FilePart,
    ) -> ApiResult<ApiResponse<T>> {
        self.upload(target, file).await?.decode()
    }

    pub async fn execute_json<T: DeserializeOwned>(
        &self,
        request: PendingRequest,
    ) -> ApiResult<ApiResponse<T>> {
        self.execute(request).await?.decode()
    }

    /// Send `request` with gating, token refresh and network retries.
    pub async fn execute(&self, request: PendingRequest) -> ApiResult<ApiResponse<Bytes>> {
        let mut ctx = RequestContext::new(request.method.clone(), &request.target);
        tracing::debug!(
            request_id = %ctx.request_id(),
            method = %ctx.method(),
            endpoint = %ctx.endpoint(),
            "Dispatching request"
        );

        let result = self.run(&mut ctx, &request).await;
        match &result {
            Ok(response) => tracing::debug!(
                request_id = %ctx.request_id(),
                method = %ctx.method(),
                endpoint = %ctx.endpoint(),
                status = response.status,
                duration_ms = response.meta.duration_ms,
                cached = response.meta.cached,
                "Request completed"
            ),
            Err(ApiError::AuthExpired { .. }) => self.expire_session(&ctx),
            Err(e) if e.kind().is_gated() => tracing::warn!(
                request_id = %ctx.request_id(),
                method = %ctx.method(),
                endpoint = %ctx.endpoint(),
                error = %e,
                "Request refused locally"
            ),
            Err(e @ ApiError::Network { .. }) => tracing::error!(
                request_id = %ctx.request_id(),
                method = %ctx.method(),
                endpoint = %ctx.endpoint(),
                attempts = ctx.attempts(),
                error = %e,
                "Request failed"
            ),
            Err(e) => tracing::warn!(
                request_id = %ctx.request_id(),
                method = %ctx.method(),
                endpoint = %ctx.endpoint(),
                status = ?e.status(),
                duration_ms = ctx.elapsed().as_millis() as u64,
                error = %e,
                "Request failed"
            ),
        }
        result
    }

    async fn run(
        &self,
        ctx: &mut RequestContext,
        request: &PendingRequest,
    ) -> ApiResult<ApiResponse<Bytes>> {
        match self.dispatch_once(ctx, request).await? {
            DispatchOutcome::Response(raw) if raw.status == StatusCode::UNAUTHORIZED => {
                self.recover_unauthorized(ctx, request, raw).await
            }
            DispatchOutcome::Response(raw) => self.classify(ctx, raw),
            DispatchOutcome::Failed(error) => self.retry_network(ctx, request, error).await,
        }
    }

    /// One pass through the hooks and the transport. Errors only come from
    /// the pre-dispatch hooks or from building the request.
    async fn dispatch_once(
        &self,
        ctx: &mut RequestContext,
        request: &PendingRequest,
    ) -> ApiResult<DispatchOutcome> {
        ctx.record_attempt();
        let mut request = request.clone();
        for hook in &self.inner.pre_hooks {
            hook.before(ctx, &mut request)?;
        }

        let url = self.url_for(&request.target);
        let builder = self
            .inner
            .http
            .request(request.method.clone(), url)
            .headers(request.headers.clone());
        let builder = request.apply_body(builder)?;

        let outcome = match builder.send().await {
            Ok(response) => {
                let status = response.status();
                let headers = response.headers().clone();
                match response.bytes().await {
                    Ok(body) => DispatchOutcome::Response(RawResponse {
                        status,
                        headers,
                        body,
                    }),
                    Err(e) => DispatchOutcome::Failed(e),
                }
            }
            Err(e) => DispatchOutcome::Failed(e),
        };

        for hook in &self.inner.post_hooks {
            hook.after(ctx, &outcome);
        }
        Ok(outcome)
    }

    async fn recover_unauthorized(
        &self,
        ctx: &mut RequestContext,
        request: &PendingRequest,
        raw: RawResponse,
    ) -> ApiResult<ApiResponse<Bytes>> {
        let previous = self.inner.session.load();
        self.inner.session.clear();

        let refresh_token = match previous.refresh_token() {
            Some(token) if !ctx.retried() => token.to_string(),
            _ => return Err(auth_expired(ctx, &raw)),
        };

        match self.refresh_access_token(ctx, &refresh_token).await {
            Ok((access_token, rotated)) => {
                self.inner.session.store(Session {
                    access_token: Some(access_token),
                    refresh_token: Some(rotated.unwrap_or(refresh_token)),
                    user: previous.user,
                });
                metrics::record_token_refresh("success");
                metrics::record_retry("token_refresh");
                self.inner.events.emit(SessionEvent::TokenRefreshed);
                tracing::info!(
                    request_id = %ctx.request_id(),
                    endpoint = %ctx.endpoint(),
                    "Access token refreshed, re-sending request"
                );
            }
            Err(e) => {
                metrics::record_token_refresh("failure");
                tracing::warn!(
                    request_id = %ctx.request_id(),
                    endpoint = %ctx.endpoint(),
                    error = %e,
                    "Token refresh failed"
                );
                return Err(auth_expired(ctx, &raw));
            }
        }

        ctx.mark_retried();
        match self.dispatch_once(ctx, request).await? {
            DispatchOutcome::Response(raw) => self.classify(ctx, raw),
            DispatchOutcome::Failed(error) => Err(network_error(ctx, error)),
        }
    }

    /// Exchange the refresh token for a new access token. Returns the access
    /// token and the rotated refresh token, if the server sent one.
    async fn refresh_access_token(
        &self,
        parent: &RequestContext,
        refresh_token: &str,
    ) -> ApiResult<(String, Option<String>)> {
        let request =
            PendingRequest::post(REFRESH_PATH).with_json(json!({ "refreshToken": refresh_token }));
        let mut ctx = RequestContext::new(request.method.clone(), &request.target);
        ctx.mark_retried();
        tracing::debug!(
            request_id = %ctx.request_id(),
            parent_request_id = %parent.request_id(),
            "Refreshing access token"
        );

        let raw = match self.dispatch_once(&mut ctx, &request).await? {
            DispatchOutcome::Response(raw) => raw,
            DispatchOutcome::Failed(error) => return Err(network_error(&ctx, error)),
        };
        let response = self.classify(&ctx, raw)?.decode::<RefreshedTokens>()?;
        response.data.into_pair().ok_or_else(|| {
            ApiError::InvalidRequest("refresh response carried no access token".to_string())
        })
    }

    async fn retry_network(
        &self,
        ctx: &mut RequestContext,
        request: &PendingRequest,
        error: reqwest::Error,
    ) -> ApiResult<ApiResponse<Bytes>> {
        let policy = self.inner.retry;
        if ctx.retried() || policy.max_attempts == 0 || !is_retryable(&error) {
            return Err(network_error(ctx, error));
        }
        ctx.mark_retried();

        let mut last = error;
        for (attempt, delay) in policy.schedule() {
            tracing::warn!(
                request_id = %ctx.request_id(),
                method = %ctx.method(),
                endpoint = %ctx.endpoint(),
                attempt,
                max_attempts = policy.max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %last,
                "No response, retrying"
            );
            metrics::record_retry("network");
            tokio::time::sleep(delay).await;

            match self.dispatch_once(ctx, request).await? {
                DispatchOutcome::Response(raw) => return self.classify(ctx, raw),
                DispatchOutcome::Failed(e) => last = e,
            }
        }
        Err(network_error(ctx, last))
    }

    /// Map a response to success or to its classified error.
    fn classify(&self, ctx: &RequestContext, raw: RawResponse) -> ApiResult<ApiResponse<Bytes>> {
        let status = raw.status;
        if status.is_success() {
            return Ok(ApiResponse::from_raw(ctx, raw));
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(auth_expired(ctx, &raw));
        }

        let retry_after_raw = raw
            .header(RETRY_AFTER)
            .map(str::trim)
            .filter(|v| !v.is_empty());
        let retry_after = retry_after_raw.and_then(|v| v.parse::<u64>().ok());
        let message = if status == StatusCode::TOO_MANY_REQUESTS {
            match retry_after_raw {
                Some(value) => too_many_requests_message(value),
                None => too_many_requests_message(
                    &self.inner.config.rate_limit.default_retry_after_secs.to_string(),
                ),
            }
        } else if status.is_server_error() {
            MSG_SERVICE_UNAVAILABLE.to_string()
        } else {
            message_for_status(status.as_u16(), raw.server_message().as_deref())
        };

        Err(ApiError::Http(Box::new(HttpError {
            status: status.as_u16(),
            endpoint: ctx.endpoint().to_string(),
            request_id: ctx.request_id().to_string(),
            message,
            details: raw.server_details(),
            retry_after,
        })))
    }

    fn expire_session(&self, ctx: &RequestContext) {
        self.inner.session.clear();
        self.inner.events.emit(SessionEvent::LoginRequired {
            request_id: ctx.request_id().to_string(),
        });
        tracing::warn!(
            request_id = %ctx.request_id(),
            method = %ctx.method(),
            endpoint = %ctx.endpoint(),
            "Session expired, login required"
        );
    }

    fn url_for(&self, target: &str) -> String {
        if target.starts_with('/') {
            format!("{}{}", self.inner.base_url, target)
        } else {
            format!("{}/{}", self.inner.base_url, target)
        }
    }
}

fn to_json<B: Serialize + ?Sized>(body: &B) -> ApiResult<Value> {
    serde_json::to_value(body)
        .map_err(|e| ApiError::InvalidRequest(format!("body is not serializable: {e}")))
}

fn auth_expired(ctx: &RequestContext, raw: &RawResponse) -> ApiError {
    let message = raw
        .server_message()
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| MSG_UNEXPECTED.to_string());
    ApiError::AuthExpired {
        endpoint: ctx.endpoint().to_string(),
        request_id: ctx.request_id().to_string(),
        message,
    }
}

fn network_error(ctx: &RequestContext, source: reqwest::Error) -> ApiError {
    ApiError::Network {
        endpoint: ctx.endpoint().to_string(),
        request_id: ctx.request_id().to_string(),
        attempts: ctx.attempts(),
        message: MSG_NETWORK.to_string(),
        source,
    }
}
