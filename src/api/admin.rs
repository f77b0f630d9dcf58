//! `/admin` endpoints. Responses are passed through as JSON.

use serde_json::{json, Value};

use crate::api::path_segment;
use crate::error::ApiResult;
use crate::http::{ApiClient, ApiResponse};

pub struct AdminApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AdminApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn cache_stats(&self) -> ApiResult<ApiResponse<Value>> {
        self.client.get_json("/admin/cache/stats").await
    }

    pub async fn cache_names(&self) -> ApiResult<ApiResponse<Value>> {
        self.client.get_json("/admin/cache/names").await
    }

    pub async fn clear_cache(&self, name: &str) -> ApiResult<ApiResponse<Value>> {
        let name = path_segment(name)?;
        self.client
            .delete_json(&format!("/admin/cache/{name}"))
            .await
    }

    pub async fn clear_all_caches(&self) -> ApiResult<ApiResponse<Value>> {
        self.client.delete_json("/admin/cache/all").await
    }

    pub async fn system_health(&self) -> ApiResult<ApiResponse<Value>> {
        self.client.get_json("/admin/health").await
    }

    pub async fn metrics(&self) -> ApiResult<ApiResponse<Value>> {
        self.client.get_json("/admin/metrics").await
    }

    pub async fn info(&self) -> ApiResult<ApiResponse<Value>> {
        self.client.get_json("/admin/info").await
    }

    pub async fn rate_limit_stats(&self) -> ApiResult<ApiResponse<Value>> {
        self.client.get_json("/admin/rate-limit/stats").await
    }

    pub async fn circuit_breaker_status(&self) -> ApiResult<ApiResponse<Value>> {
        self.client.get_json("/admin/circuit-breaker/status").await
    }

    pub async fn log_level(&self) -> ApiResult<ApiResponse<Value>> {
        self.client.get_json("/admin/logging").await
    }

    /// Change the server log level. An empty `logger` targets the root logger.
    pub async fn set_log_level(&self, level: &str, logger: &str) -> ApiResult<ApiResponse<Value>> {
        self.client
            .post_json("/admin/logging", &json!({ "level": level, "logger": logger }))
            .await
    }

    pub async fn security_events(&self) -> ApiResult<ApiResponse<Value>> {
        self.client.get_json("/admin/security/events").await
    }

    pub async fn report_incident(&self, incident: &Value) -> ApiResult<ApiResponse<Value>> {
        self.client
            .post_json("/admin/security/incident", incident)
            .await
    }

    pub async fn email_stats(&self) -> ApiResult<ApiResponse<Value>> {
        self.client.get_json("/admin/email/stats").await
    }
}
