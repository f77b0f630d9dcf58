//! Actuator and metrics endpoints.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ApiResult;
use crate::http::{ApiClient, ApiResponse};

pub struct MonitoringApi<'a> {
    client: &'a ApiClient,
}

/// Combined view of backend health and application metrics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemHealth {
    /// Reported status, or `DOWN` when either probe failed.
    pub status: String,
    pub components: Value,
    pub metrics: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl SystemHealth {
    pub fn is_up(&self) -> bool {
        self.status.eq_ignore_ascii_case("UP")
    }
}

impl<'a> MonitoringApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn health(&self) -> ApiResult<ApiResponse<Value>> {
        self.client.get_json("/actuator/health").await
    }

    pub async fn metrics(&self) -> ApiResult<ApiResponse<Value>> {
        self.client.get_json("/actuator/metrics").await
    }

    pub async fn info(&self) -> ApiResult<ApiResponse<Value>> {
        self.client.get_json("/actuator/info").await
    }

    /// Prometheus text exposition.
    pub async fn prometheus(&self) -> ApiResult<ApiResponse<String>> {
        let response = self.client.get("/actuator/prometheus").await?;
        Ok(response.map(|body| String::from_utf8_lossy(&body).into_owned()))
    }

    pub async fn application_metrics(&self) -> ApiResult<ApiResponse<Value>> {
        self.client.get_json("/admin/metrics/application").await
    }

    pub async fn performance_metrics(&self) -> ApiResult<ApiResponse<Value>> {
        self.client.get_json("/admin/metrics/performance").await
    }

    /// Probe health and application metrics concurrently. Never fails; any
    /// error is folded into a `DOWN` status.
    pub async fn check_system_health(&self) -> SystemHealth {
        let (health, metrics) = tokio::join!(self.health(), self.application_metrics());
        match (health, metrics) {
            (Ok(health), Ok(metrics)) => SystemHealth {
                status: health
                    .data
                    .get("status")
                    .and_then(Value::as_str)
                    .unwrap_or("DOWN")
                    .to_string(),
                components: health
                    .data
                    .get("components")
                    .cloned()
                    .unwrap_or_else(|| Value::Object(Map::new())),
                metrics: if metrics.data.is_null() {
                    Value::Object(Map::new())
                } else {
                    metrics.data
                },
                error: None,
                timestamp: Utc::now(),
            },
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "System health check failed");
                SystemHealth {
                    status: "DOWN".to_string(),
                    components: Value::Object(Map::new()),
                    metrics: Value::Object(Map::new()),
                    error: Some(e.user_message().to_string()),
                    timestamp: Utc::now(),
                }
            }
        }
    }
}
