//! Token refresh, session expiry and login/logout.

use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use jobportal_client::auth::{Session, SessionEvent, SessionStore};
use jobportal_client::models::{LoginRequest, User, UserRole};
use jobportal_client::{ApiError, ErrorKind};

mod common;
use common::Hits;

fn user() -> User {
    User {
        id: 7,
        email: "ada@example.com".into(),
        full_name: Some("Ada".into()),
        role: UserRole::Candidate,
        phone: None,
        created_at: None,
    }
}

fn signed_in(refresh: Option<&str>) -> Session {
    Session {
        access_token: Some("old-token".into()),
        refresh_token: refresh.map(str::to_string),
        user: Some(user()),
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// `/applications/my` accepts only `Bearer new-token`; `/auth/refresh`
/// answers with `refresh_status`.
fn protected_router(protected: Hits, refresh: Hits, refresh_status: StatusCode) -> Router {
    Router::new()
        .route(
            "/applications/my",
            get(move |headers: HeaderMap| {
                let protected = protected.clone();
                async move {
                    protected.hit();
                    if bearer(&headers).as_deref() == Some("Bearer new-token") {
                        (StatusCode::OK, Json(json!({"success": true, "data": []})))
                    } else {
                        (StatusCode::UNAUTHORIZED, Json(json!({"message": "Token expired"})))
                    }
                }
            }),
        )
        .route(
            "/auth/refresh",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let refresh = refresh.clone();
                async move {
                    refresh.hit();
                    assert_eq!(body["refreshToken"], "refresh-1");
                    assert_eq!(bearer(&headers), None, "credentials are cleared before refresh");
                    if refresh_status.is_success() {
                        (
                            refresh_status,
                            Json(json!({
                                "success": true,
                                "data": {"accessToken": "new-token", "refreshToken": "refresh-2"}
                            })),
                        )
                    } else {
                        (refresh_status, Json(json!({"message": "Refresh token revoked"})))
                    }
                }
            }),
        )
}

#[tokio::test]
async fn test_expired_token_is_refreshed_once() {
    let (protected, refresh) = (Hits::new(), Hits::new());
    let addr = common::start_mock_backend(protected_router(
        protected.clone(),
        refresh.clone(),
        StatusCode::OK,
    ))
    .await;
    let (client, store) =
        common::client_with_session(common::test_config(addr), signed_in(Some("refresh-1")));
    let mut events = client.subscribe_session_events();

    let response = client.applications().mine().await.unwrap();
    assert!(response.data.success);
    assert_eq!(protected.count(), 2);
    assert_eq!(refresh.count(), 1);

    let session = store.load();
    assert_eq!(session.access_token.as_deref(), Some("new-token"));
    assert_eq!(session.refresh_token.as_deref(), Some("refresh-2"));
    assert_eq!(session.user, Some(user()));
    assert!(matches!(events.try_recv(), Ok(SessionEvent::TokenRefreshed)));
}

#[tokio::test]
async fn test_failed_refresh_requires_login() {
    let (protected, refresh) = (Hits::new(), Hits::new());
    let addr = common::start_mock_backend(protected_router(
        protected.clone(),
        refresh.clone(),
        StatusCode::UNAUTHORIZED,
    ))
    .await;
    let (client, store) =
        common::client_with_session(common::test_config(addr), signed_in(Some("refresh-1")));
    let mut events = client.subscribe_session_events();

    let err = client.get("/applications/my").await.unwrap_err();
    assert!(matches!(err, ApiError::AuthExpired { .. }));
    assert_eq!(err.kind(), ErrorKind::AuthExpired);
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.user_message(), "Token expired");
    assert_eq!(protected.count(), 1);
    assert_eq!(refresh.count(), 1);

    assert_eq!(store.load(), Session::default());
    match events.try_recv() {
        Ok(SessionEvent::LoginRequired { request_id }) => {
            assert_eq!(Some(request_id.as_str()), err.request_id())
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_refresh_token_skips_refresh() {
    let (protected, refresh) = (Hits::new(), Hits::new());
    let addr = common::start_mock_backend(protected_router(
        protected.clone(),
        refresh.clone(),
        StatusCode::OK,
    ))
    .await;
    let (client, store) = common::client_with_session(common::test_config(addr), signed_in(None));
    let mut events = client.subscribe_session_events();

    let err = client.get("/applications/my").await.unwrap_err();
    assert!(matches!(err, ApiError::AuthExpired { .. }));
    assert_eq!(refresh.count(), 0);
    assert!(!store.load().is_authenticated());
    assert!(matches!(
        events.try_recv(),
        Ok(SessionEvent::LoginRequired { .. })
    ));
}

#[tokio::test]
async fn test_second_unauthorized_after_refresh_gives_up() {
    let (protected, refresh) = (Hits::new(), Hits::new());
    let counter = protected.clone();
    let refresh_counter = refresh.clone();
    let router = Router::new()
        .route(
            "/jobs",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.hit();
                    (StatusCode::UNAUTHORIZED, Json(json!({})))
                }
            }),
        )
        .route(
            "/auth/refresh",
            post(move || {
                let refresh = refresh_counter.clone();
                async move {
                    refresh.hit();
                    Json(json!({"accessToken": "new-token"}))
                }
            }),
        );
    let addr = common::start_mock_backend(router).await;
    let (client, store) =
        common::client_with_session(common::test_config(addr), signed_in(Some("refresh-1")));

    let err = client.get("/jobs").await.unwrap_err();
    assert!(matches!(err, ApiError::AuthExpired { .. }));
    assert_eq!(err.user_message(), "An unexpected error occurred.");
    assert_eq!(protected.count(), 2);
    assert_eq!(refresh.count(), 1);
    assert_eq!(store.load(), Session::default());
}

#[tokio::test]
async fn test_login_stores_session_and_sends_bearer() {
    let router = Router::new()
        .route(
            "/auth/login",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["email"], "ada@example.com");
                Json(json!({
                    "success": true,
                    "message": "Login successful",
                    "data": {
                        "accessToken": "access-1",
                        "refreshToken": "refresh-1",
                        "tokenType": "Bearer",
                        "user": {"id": 7, "email": "ada@example.com", "fullName": "Ada", "role": "CANDIDATE"}
                    }
                }))
            }),
        )
        .route(
            "/auth/session",
            get(|headers: HeaderMap| async move { Json(json!({ "authorization": bearer(&headers) })) }),
        )
        .route("/auth/logout", post(|| async { Json(json!({"success": true})) }));
    let addr = common::start_mock_backend(router).await;
    let (client, store) = common::client_with_session(common::test_config(addr), Session::default());
    let mut events = client.subscribe_session_events();

    let response = client
        .auth()
        .login(&LoginRequest {
            email: "ada@example.com".into(),
            password: "secret".into(),
        })
        .await
        .unwrap();
    assert_eq!(response.data.message.as_deref(), Some("Login successful"));
    assert_eq!(store.load().refresh_token.as_deref(), Some("refresh-1"));
    assert_eq!(store.load().user.map(|u| u.id), Some(7));
    assert!(matches!(events.try_recv(), Ok(SessionEvent::LoggedIn)));

    let session = client.auth().current_session().await.unwrap();
    assert_eq!(session.data["authorization"], "Bearer access-1");

    client.auth().logout().await.unwrap();
    assert_eq!(store.load(), Session::default());
    assert!(matches!(events.try_recv(), Ok(SessionEvent::LoggedOut)));
}
