//! Job postings.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecruiterInfo {
    pub id: i64,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub min_salary: Option<f64>,
    #[serde(default)]
    pub max_salary: Option<f64>,
    #[serde(default)]
    pub experience_required: Option<String>,
    /// Comma-separated skill list.
    #[serde(default)]
    pub skills_required: Option<String>,
    /// Some deployments send skills as a list instead.
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub application_deadline: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub posted_at: Option<String>,
    #[serde(default)]
    pub recruiter: Option<RecruiterInfo>,
}

impl Job {
    /// Skills from `skillsRequired` followed by `requirements`, trimmed and
    /// without empties.
    pub fn required_skills(&self) -> Vec<String> {
        self.skills_required
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .chain(self.requirements.iter().map(|s| s.trim()))
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Body for creating or updating a job.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub title: String,
    pub description: String,
    pub company: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_salary: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_salary: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_required: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills_required: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_deadline: Option<String>,
}

/// Optional search criteria; unset fields are left out of the query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobSearchFilters {
    pub keyword: Option<String>,
    pub location: Option<String>,
    pub min_salary: Option<u64>,
    pub max_salary: Option<u64>,
    pub experience_required: Option<String>,
}

impl JobSearchFilters {
    pub fn keyword(keyword: impl Into<String>) -> Self {
        Self {
            keyword: Some(keyword.into()),
            ..Self::default()
        }
    }

    /// URL-encoded query string, without the leading `?`.
    pub fn to_query(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        let mut push = |key: &str, value: Option<String>| {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                query.append_pair(key, &value);
            }
        };
        push("keyword", self.keyword.clone());
        push("location", self.location.clone());
        push("minSalary", self.min_salary.map(|v| v.to_string()));
        push("maxSalary", self.max_salary.map(|v| v.to_string()));
        push("experienceRequired", self.experience_required.clone());
        query.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_skips_unset_fields() {
        let filters = JobSearchFilters {
            keyword: Some("rust developer".into()),
            location: Some(String::new()),
            min_salary: Some(90_000),
            ..JobSearchFilters::default()
        };
        assert_eq!(filters.to_query(), "keyword=rust+developer&minSalary=90000");
        assert_eq!(JobSearchFilters::default().to_query(), "");
    }

    #[test]
    fn test_required_skills_merges_sources() {
        let job: Job = serde_json::from_str(
            r#"{"id": 3, "title": "DevOps Engineer", "skillsRequired": "AWS, Docker,,", "requirements": ["Kubernetes"]}"#,
        )
        .unwrap();
        assert_eq!(job.required_skills(), vec!["AWS", "Docker", "Kubernetes"]);
    }
}
