//! `/jobs` endpoints.

use serde_json::Value;

use crate::error::ApiResult;
use crate::http::{ApiClient, ApiResponse};
use crate::models::{Application, ApiEnvelope, ApplyRequest, Job, JobRequest, JobSearchFilters};

pub struct JobsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> JobsApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// One page of active jobs. Pages start at 0.
    pub async fn list(&self, page: u32, size: u32) -> ApiResult<ApiResponse<ApiEnvelope<Vec<Job>>>> {
        self.client
            .get_json(&format!("/jobs?page={page}&size={size}"))
            .await
    }

    pub async fn get(&self, id: i64) -> ApiResult<ApiResponse<ApiEnvelope<Job>>> {
        self.client.get_json(&format!("/jobs/{id}")).await
    }

    pub async fn create(&self, job: &JobRequest) -> ApiResult<ApiResponse<ApiEnvelope<Job>>> {
        self.client.post_json("/jobs", job).await
    }

    pub async fn update(
        &self,
        id: i64,
        job: &JobRequest,
    ) -> ApiResult<ApiResponse<ApiEnvelope<Job>>> {
        self.client.put_json(&format!("/jobs/{id}"), job).await
    }

    pub async fn delete(&self, id: i64) -> ApiResult<ApiResponse<ApiEnvelope<Value>>> {
        self.client.delete_json(&format!("/jobs/{id}")).await
    }

    pub async fn search(
        &self,
        filters: &JobSearchFilters,
    ) -> ApiResult<ApiResponse<ApiEnvelope<Vec<Job>>>> {
        self.client
            .get_json(&format!("/jobs/search?{}", filters.to_query()))
            .await
    }

    pub async fn apply(
        &self,
        job_id: i64,
        application: &ApplyRequest,
    ) -> ApiResult<ApiResponse<ApiEnvelope<Application>>> {
        self.client
            .post_json(&format!("/jobs/{job_id}/apply"), application)
            .await
    }

    pub async fn applications(
        &self,
        job_id: i64,
    ) -> ApiResult<ApiResponse<ApiEnvelope<Vec<Application>>>> {
        self.client
            .get_json(&format!("/jobs/{job_id}/applications"))
            .await
    }

    pub async fn my_applications(&self) -> ApiResult<ApiResponse<ApiEnvelope<Vec<Application>>>> {
        self.client.get_json("/applications/my").await
    }
}
