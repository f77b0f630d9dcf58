//! Job applications.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Pending,
    UnderReview,
    Shortlisted,
    Interviewed,
    Accepted,
    Rejected,
    Withdrawn,
}

impl std::str::FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        serde_json::from_value(serde_json::Value::String(normalized))
            .map_err(|_| format!("unknown application status '{s}'"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateInfo {
    pub id: i64,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: i64,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub resume_url: Option<String>,
    #[serde(default)]
    pub cover_letter: Option<String>,
    #[serde(default)]
    pub recruiter_notes: Option<String>,
    #[serde(default)]
    pub applied_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub candidate: Option<CandidateInfo>,
    #[serde(default)]
    pub job: Option<JobSummary>,
}

/// Body of `POST /jobs/{id}/apply`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
    /// Falls back to the user's default resume when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
}

/// Body of `PUT /applications/{id}/status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdate {
    pub status: ApplicationStatus,
    pub notes: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!(
            "under review".parse::<ApplicationStatus>().unwrap(),
            ApplicationStatus::UnderReview
        );
        assert_eq!(
            "SHORTLISTED".parse::<ApplicationStatus>().unwrap(),
            ApplicationStatus::Shortlisted
        );
        assert!("hired".parse::<ApplicationStatus>().is_err());
    }

    #[test]
    fn test_status_update_shape() {
        let update = StatusUpdate {
            status: ApplicationStatus::Interviewed,
            notes: String::new(),
        };
        assert_eq!(
            serde_json::to_string(&update).unwrap(),
            r#"{"status":"INTERVIEWED","notes":""}"#
        );
    }
}
