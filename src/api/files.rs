//! `/files` endpoints.

use std::path::Path;

use crate::error::ApiResult;
use crate::http::{ApiClient, ApiResponse, FilePart};
use crate::models::{ApiEnvelope, FileUploadResponse};

/// Multipart field the backend reads the upload from.
pub const UPLOAD_FIELD: &str = "file";

pub struct FilesApi<'a> {
    client: &'a ApiClient,
}

impl<'a> FilesApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Upload a resume. Type and size limits are enforced by the server.
    pub async fn upload_resume(
        &self,
        path: &Path,
    ) -> ApiResult<ApiResponse<ApiEnvelope<FileUploadResponse>>> {
        let file = FilePart::from_path(UPLOAD_FIELD, path)?;
        tracing::debug!(
            file_name = %file.file_name,
            mime = %file.mime,
            size = file.bytes.len(),
            "Uploading resume"
        );
        self.client.upload_json("/files/upload", file).await
    }
}
