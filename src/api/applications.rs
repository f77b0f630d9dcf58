//! `/applications` endpoints.

use serde_json::Value;

use crate::error::ApiResult;
use crate::http::{ApiClient, ApiResponse};
use crate::models::{Application, ApplicationStatus, ApiEnvelope, ApplyRequest, StatusUpdate};

pub struct ApplicationsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ApplicationsApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn apply(
        &self,
        job_id: i64,
        application: &ApplyRequest,
    ) -> ApiResult<ApiResponse<ApiEnvelope<Application>>> {
        self.client.jobs().apply(job_id, application).await
    }

    /// Move an application through the hiring pipeline.
    pub async fn update_status(
        &self,
        id: i64,
        status: ApplicationStatus,
        notes: &str,
    ) -> ApiResult<ApiResponse<ApiEnvelope<Application>>> {
        let update = StatusUpdate {
            status,
            notes: notes.to_string(),
        };
        self.client
            .put_json(&format!("/applications/{id}/status"), &update)
            .await
    }

    pub async fn get(&self, id: i64) -> ApiResult<ApiResponse<ApiEnvelope<Application>>> {
        self.client.get_json(&format!("/applications/{id}")).await
    }

    pub async fn mine(&self) -> ApiResult<ApiResponse<ApiEnvelope<Vec<Application>>>> {
        self.client.get_json("/applications/my").await
    }

    pub async fn for_job(
        &self,
        job_id: i64,
    ) -> ApiResult<ApiResponse<ApiEnvelope<Vec<Application>>>> {
        self.client.jobs().applications(job_id).await
    }

    pub async fn withdraw(&self, id: i64) -> ApiResult<ApiResponse<ApiEnvelope<Value>>> {
        self.client
            .delete_json(&format!("/applications/{id}"))
            .await
    }
}
