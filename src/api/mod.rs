//! Typed endpoint groups.
//!
//! Each group borrows the [`ApiClient`] and maps one backend area onto
//! typed calls. Everything goes through the client, so gating, token
//! refresh and retries apply uniformly.

pub mod admin;
pub mod applications;
pub mod auth;
pub mod email;
pub mod files;
pub mod jobs;
pub mod monitoring;

pub use admin::AdminApi;
pub use applications::ApplicationsApi;
pub use auth::AuthApi;
pub use email::EmailApi;
pub use files::FilesApi;
pub use jobs::JobsApi;
pub use monitoring::{MonitoringApi, SystemHealth};

use crate::error::{ApiError, ApiResult};
use crate::http::ApiClient;

impl ApiClient {
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    pub fn jobs(&self) -> JobsApi<'_> {
        JobsApi::new(self)
    }

    pub fn applications(&self) -> ApplicationsApi<'_> {
        ApplicationsApi::new(self)
    }

    pub fn admin(&self) -> AdminApi<'_> {
        AdminApi::new(self)
    }

    pub fn monitoring(&self) -> MonitoringApi<'_> {
        MonitoringApi::new(self)
    }

    pub fn email(&self) -> EmailApi<'_> {
        EmailApi::new(self)
    }

    pub fn files(&self) -> FilesApi<'_> {
        FilesApi::new(self)
    }
}

/// A value interpolated into a URL path. Refuses anything that would change
/// the path structure.
pub(crate) fn path_segment(value: &str) -> ApiResult<&str> {
    let value = value.trim();
    if value.is_empty() || value.contains(['/', '?', '#', '%']) || value.contains(char::is_whitespace) {
        return Err(ApiError::InvalidRequest(format!(
            "'{value}' is not a valid path segment"
        )));
    }
    Ok(value)
}
