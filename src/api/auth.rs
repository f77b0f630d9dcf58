//! `/auth` endpoints.

use serde_json::{json, Value};

use crate::auth::{Session, SessionEvent};
use crate::error::ApiResult;
use crate::http::{ApiClient, ApiResponse, PendingRequest};
use crate::models::{ApiEnvelope, AuthResponse, LoginRequest, RegisterRequest, User};

pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn register(
        &self,
        request: &RegisterRequest,
    ) -> ApiResult<ApiResponse<ApiEnvelope<User>>> {
        self.client.post_json("/auth/register", request).await
    }

    /// Sign in and keep the issued tokens in the client's session store.
    pub async fn login(
        &self,
        request: &LoginRequest,
    ) -> ApiResult<ApiResponse<ApiEnvelope<AuthResponse>>> {
        let response: ApiResponse<ApiEnvelope<AuthResponse>> =
            self.client.post_json("/auth/login", request).await?;

        match &response.data.data {
            Some(auth) if !auth.access_token.is_empty() => {
                self.client.session().store(Session {
                    access_token: Some(auth.access_token.clone()),
                    refresh_token: auth.refresh_token.clone(),
                    user: auth.user.clone(),
                });
                self.client.session_events().emit(SessionEvent::LoggedIn);
                tracing::info!(
                    request_id = %response.meta.request_id,
                    email = %request.email,
                    "Logged in"
                );
            }
            _ => tracing::warn!(
                request_id = %response.meta.request_id,
                "Login response carried no access token"
            ),
        }
        Ok(response)
    }

    pub async fn refresh(
        &self,
        refresh_token: &str,
    ) -> ApiResult<ApiResponse<ApiEnvelope<AuthResponse>>> {
        self.client
            .post_json("/auth/refresh", &json!({ "refreshToken": refresh_token }))
            .await
    }

    pub async fn current_session(&self) -> ApiResult<ApiResponse<Value>> {
        self.client.get_json("/auth/session").await
    }

    /// Invalidate the server session. Local credentials are cleared even when
    /// the server call fails.
    pub async fn logout(&self) -> ApiResult<ApiResponse<Value>> {
        let result = self
            .client
            .execute_json(PendingRequest::post("/auth/logout"))
            .await;
        self.client.session().clear();
        self.client.session_events().emit(SessionEvent::LoggedOut);
        result
    }
}
