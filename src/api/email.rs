//! `/email` endpoints.

use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::http::{ApiClient, ApiResponse, PendingRequest};

pub struct EmailApi<'a> {
    client: &'a ApiClient,
}

impl<'a> EmailApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn send_welcome(&self, user_id: i64) -> ApiResult<ApiResponse<Value>> {
        self.client
            .execute_json(PendingRequest::post(format!("/email/welcome/{user_id}")))
            .await
    }

    pub async fn send_test(&self, email: &str) -> ApiResult<ApiResponse<Value>> {
        self.client
            .post_json("/email/test", &json!({ "email": email }))
            .await
    }
}
