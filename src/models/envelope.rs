//! Response envelope shared by the backend's endpoints.

use serde::{Deserialize, Serialize};

/// `{success, message, data, total, errors}` wrapper the backend puts around
/// payloads. Every field is optional on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<T>,
    pub total: Option<u64>,
    pub errors: Option<Vec<String>>,
}

impl<T> Default for ApiEnvelope<T> {
    fn default() -> Self {
        Self {
            success: false,
            message: None,
            data: None,
            total: None,
            errors: None,
        }
    }
}

impl<T> ApiEnvelope<T> {
    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_envelope() {
        let env: ApiEnvelope<Vec<u32>> =
            serde_json::from_str(r#"{"success":true,"data":[1,2],"total":2}"#).unwrap();
        assert!(env.success);
        assert_eq!(env.total, Some(2));
        assert_eq!(env.into_data(), Some(vec![1, 2]));

        let env: ApiEnvelope<u32> = serde_json::from_str("{}").unwrap();
        assert!(!env.success);
        assert!(env.data.is_none());
    }
}
