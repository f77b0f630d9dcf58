//! End-to-end endpoint group scenarios against a mock backend.

use std::collections::HashMap;
use std::io::Write;

use axum::body::Bytes;
use axum::extract::{Path, Query, RawQuery};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use jobportal_client::error::{ErrorCode, MSG_SERVICE_UNAVAILABLE};
use jobportal_client::http::measure;
use jobportal_client::models::{ApplicationStatus, JobSearchFilters};
use jobportal_client::ErrorKind;

mod common;
use common::Hits;

fn job_json(id: i64) -> Value {
    json!({
        "id": id,
        "title": "Rust Engineer",
        "company": "Ferrous Systems",
        "location": "Remote",
        "skillsRequired": "Rust, Docker, PostgreSQL",
        "isActive": true
    })
}

#[tokio::test]
async fn test_job_listing_reports_cache_status() {
    let hits = Hits::new();
    let counter = hits.clone();
    let router = Router::new().route(
        "/jobs",
        get(move |Query(params): Query<HashMap<String, String>>| {
            let counter = counter.clone();
            async move {
                assert_eq!(params.get("page").map(String::as_str), Some("0"));
                assert_eq!(params.get("size").map(String::as_str), Some("10"));
                let cache = if counter.hit() == 0 { "MISS" } else { "HIT" };
                let mut headers = HeaderMap::new();
                headers.insert("x-cache-status", cache.parse().unwrap());
                (
                    headers,
                    Json(json!({"success": true, "data": [job_json(1), job_json(2)], "total": 2})),
                )
            }
        }),
    );
    let addr = common::start_mock_backend(router).await;
    let client = common::client(common::test_config(addr));

    let first = client.jobs().list(0, 10).await.unwrap();
    assert!(!first.is_cached());
    assert_eq!(first.data.total, Some(2));
    let jobs = first.data.into_data().unwrap();
    assert_eq!(jobs[1].required_skills(), vec!["Rust", "Docker", "PostgreSQL"]);

    let second = client.jobs().list(0, 10).await.unwrap();
    assert!(second.is_cached());
    assert!(second.meta.request_id.starts_with("req_"));
}

#[tokio::test]
async fn test_missing_job_uses_status_table() {
    let hits = Hits::new();
    let counter = hits.clone();
    let router = Router::new().route(
        "/jobs/{id}",
        get(move |Path(id): Path<i64>| {
            let counter = counter.clone();
            async move {
                counter.hit();
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({"success": false, "message": format!("Job {id} does not exist")})),
                )
            }
        }),
    );
    let addr = common::start_mock_backend(router).await;
    let client = common::client(common::test_config(addr));

    let err = client.jobs().get(42).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.user_message(), "Resource not found.");

    let report = err.report();
    assert_eq!(report.code, ErrorCode::Status(404));
    assert_eq!(Some(report.request_id.as_str()), err.request_id());

    // client errors leave the circuit closed
    client.jobs().get(42).await.unwrap_err();
    assert_eq!(hits.count(), 2);
}

#[tokio::test]
async fn test_validation_error_carries_details() {
    let router = Router::new().route(
        "/jobs",
        post(|| async {
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({"message": "Invalid job", "details": {"title": "must not be blank"}})),
            )
        }),
    );
    let addr = common::start_mock_backend(router).await;
    let client = common::client(common::test_config(addr));

    let err = client.post("/jobs", &json!({"title": ""})).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.user_message(), "Validation failed. Please check your input.");
    assert_eq!(err.details().unwrap()["title"], "must not be blank");
}

#[tokio::test]
async fn test_search_builds_encoded_query() {
    let router = Router::new().route(
        "/jobs/search",
        get(|RawQuery(query): RawQuery| async move {
            Json(json!({"success": true, "data": [], "message": query}))
        }),
    );
    let addr = common::start_mock_backend(router).await;
    let client = common::client(common::test_config(addr));

    let filters = JobSearchFilters {
        keyword: Some("rust developer".into()),
        location: Some("Remote".into()),
        max_salary: Some(150_000),
        ..JobSearchFilters::default()
    };
    let response = client.jobs().search(&filters).await.unwrap();
    assert_eq!(
        response.data.message.as_deref(),
        Some("keyword=rust+developer&location=Remote&maxSalary=150000")
    );
}

#[tokio::test]
async fn test_status_update_body() {
    let router = Router::new().route(
        "/applications/{id}/status",
        put(|Path(id): Path<i64>, Json(body): Json<Value>| async move {
            Json(json!({
                "success": true,
                "data": {"id": id, "status": body["status"], "recruiterNotes": body["notes"]}
            }))
        }),
    );
    let addr = common::start_mock_backend(router).await;
    let client = common::client(common::test_config(addr));

    let response = client
        .applications()
        .update_status(5, ApplicationStatus::Shortlisted, "Strong Rust background")
        .await
        .unwrap();
    let application = response.data.into_data().unwrap();
    assert_eq!(application.id, 5);
    assert_eq!(application.status, ApplicationStatus::Shortlisted);
    assert_eq!(application.recruiter_notes.as_deref(), Some("Strong Rust background"));
}

fn resume_file(name: &str, bytes: &[u8]) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    std::fs::File::create(&path).unwrap().write_all(bytes).unwrap();
    (dir, path)
}

#[tokio::test]
async fn test_resume_upload_is_multipart() {
    let router = Router::new().route(
        "/files/upload",
        post(|headers: HeaderMap, body: Bytes| async move {
            let content_type = headers
                .get("content-type")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            assert!(content_type.starts_with("multipart/form-data"), "{content_type}");
            let body = String::from_utf8_lossy(&body).to_lowercase();
            assert!(body.contains(r#"name="file"; filename="resume.pdf""#));
            assert!(body.contains("content-type: application/pdf"));
            Json(json!({
                "success": true,
                "data": {"fileName": "resume.pdf", "fileUrl": "/files/resume.pdf", "fileSize": 9}
            }))
        }),
    );
    let addr = common::start_mock_backend(router).await;
    let client = common::client(common::test_config(addr));

    let (_dir, path) = resume_file("resume.pdf", b"%PDF-1.4\n");
    let response = client.files().upload_resume(&path).await.unwrap();
    let uploaded = response.data.into_data().unwrap();
    assert_eq!(uploaded.file_name, "resume.pdf");
    assert_eq!(uploaded.file_size, Some(9));
}

#[tokio::test]
async fn test_oversized_upload_falls_back_to_server_message() {
    let router = Router::new().route(
        "/files/upload",
        post(|| async {
            (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(json!({"success": false, "message": "File size exceeds 10MB limit"})),
            )
        }),
    );
    let addr = common::start_mock_backend(router).await;
    let client = common::client(common::test_config(addr));

    let (_dir, path) = resume_file("resume.docx", b"big");
    let err = client.files().upload_resume(&path).await.unwrap_err();
    assert_eq!(err.status(), Some(413));
    assert_eq!(err.user_message(), "File size exceeds 10MB limit");
}

#[tokio::test]
async fn test_system_health_combines_probes() {
    let router = Router::new()
        .route(
            "/actuator/health",
            get(|| async { Json(json!({"status": "UP", "components": {"db": {"status": "UP"}}})) }),
        )
        .route(
            "/admin/metrics/application",
            get(|| async { Json(json!({"activeUsers": 12})) }),
        );
    let addr = common::start_mock_backend(router).await;
    let client = common::client(common::test_config(addr));

    let health = client.monitoring().check_system_health().await;
    assert!(health.is_up());
    assert_eq!(health.components["db"]["status"], "UP");
    assert_eq!(health.metrics["activeUsers"], 12);
    assert!(health.error.is_none());
}

#[tokio::test]
async fn test_system_health_down_on_probe_failure() {
    let router = Router::new()
        .route("/actuator/health", get(|| async { Json(json!({"status": "UP"})) }))
        .route(
            "/admin/metrics/application",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
    let addr = common::start_mock_backend(router).await;
    let client = common::client(common::test_config(addr));

    let health = client.monitoring().check_system_health().await;
    assert_eq!(health.status, "DOWN");
    assert_eq!(health.error.as_deref(), Some(MSG_SERVICE_UNAVAILABLE));
}

#[tokio::test]
async fn test_measure_reports_success_and_failure() {
    let router = Router::new()
        .route("/admin/info", get(|| async { Json(json!({"version": "1.2.0"})) }))
        .route("/admin/metrics", get(|| async { StatusCode::FORBIDDEN }));
    let addr = common::start_mock_backend(router).await;
    let client = common::client(common::test_config(addr));
    let admin = client.admin();

    let ok = measure(admin.info()).await;
    assert!(ok.success());
    assert!(!ok.cached());

    let failed = measure(admin.metrics()).await;
    assert!(!failed.success());
    let report = failed.result.unwrap_err();
    assert_eq!(
        report.message,
        "Access denied. You don't have permission for this action."
    );
}

#[tokio::test]
async fn test_invalid_cache_name_is_rejected_locally() {
    let addr = common::closed_addr().await;
    let client = common::client(common::test_config(addr));

    let err = client.admin().clear_cache("../all").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Local);
}
