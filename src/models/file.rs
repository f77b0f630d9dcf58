//! Upload results.

use serde::{Deserialize, Serialize};

/// File metadata echoed back by `POST /files/upload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUploadResponse {
    pub file_name: String,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
}
