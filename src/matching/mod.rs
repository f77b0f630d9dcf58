//! Local resume analysis.
//!
//! A keyword heuristic run entirely on the client: extract skills and an
//! experience level from resume text, describe the profile, suggest
//! improvements and rank jobs by skill overlap.

pub mod skills;

pub use skills::{extract_experience, extract_skills, EXPERIENCE_UNSPECIFIED, SKILLS_CATALOG};

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::models::Job;

/// Number of jobs [`rank_jobs`] keeps.
pub const TOP_MATCHES: usize = 3;
/// Upper bound on [`suggestions`].
pub const MAX_SUGGESTIONS: usize = 4;

const BACKEND: &[&str] = &["Node.js", "Python", "Java", "PHP", "Express", "Django", "Spring"];
const FRONTEND: &[&str] = &["React", "Vue", "Angular", "HTML", "CSS", "JavaScript"];
const DATABASE: &[&str] = &["SQL", "MySQL", "PostgreSQL", "MongoDB"];
const CLOUD: &[&str] = &["AWS", "Azure", "GCP", "Docker", "Kubernetes"];
const FRAMEWORKS: &[&str] = &["React", "Vue", "Angular"];
const CLOUD_PLATFORMS: &[&str] = &["AWS", "Azure", "GCP", "Docker"];
const MODERN: &[&str] = &["TypeScript", "Docker", "Kubernetes", "CI/CD", "Microservices"];

fn has_any(skills: &[String], group: &[&str]) -> bool {
    skills.iter().any(|s| group.contains(&s.as_str()))
}

/// One-sentence profile from extracted skills and experience.
pub fn summarize(skills: &[String], experience: &str) -> String {
    let backend = has_any(skills, BACKEND);
    let frontend = has_any(skills, FRONTEND);

    let mut summary = String::from(match (frontend, backend) {
        (true, true) => "Full-stack developer with ",
        (true, false) => "Frontend developer with ",
        (false, true) => "Backend developer with ",
        (false, false) => "Professional with ",
    });

    if ["Senior", "7+", "5+"].iter().any(|k| experience.contains(k)) {
        summary.push_str("extensive experience in ");
    } else if ["0-2", "Junior"].iter().any(|k| experience.contains(k)) {
        summary.push_str("growing experience in ");
    } else {
        summary.push_str("solid experience in ");
    }

    if skills.is_empty() {
        summary.push_str("various technologies");
    } else {
        let top: Vec<&str> = skills.iter().take(3).map(String::as_str).collect();
        summary.push_str(&top.join(", "));
    }
    if has_any(skills, DATABASE) {
        summary.push_str(" and database management");
    }
    if has_any(skills, CLOUD) {
        summary.push_str(" with cloud platform expertise");
    }
    summary.push('.');
    summary
}

fn impact_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\d+%|\d+x|increased|improved|reduced").expect("impact pattern is valid")
    })
}

fn leadership_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)lead|manage|mentor|coordinate|team").expect("leadership pattern is valid")
    })
}

/// Improvement hints for a resume, at most [`MAX_SUGGESTIONS`].
pub fn suggestions(skills: &[String], text: &str) -> Vec<String> {
    let mut out = Vec::new();
    if !has_any(skills, FRAMEWORKS) {
        out.push("Consider adding modern frontend framework experience (React, Vue, or Angular)");
    }
    if !has_any(skills, CLOUD_PLATFORMS) {
        out.push("Add cloud platform certifications (AWS, Azure, or GCP) to stay competitive");
    }
    if !skills.iter().any(|s| s == "Git") && !text.to_lowercase().contains("git") {
        out.push("Include Git/GitHub experience in your resume");
    }
    if !impact_pattern().is_match(text) {
        out.push("Add quantifiable achievements and metrics to demonstrate impact");
    }
    if !leadership_pattern().is_match(text) {
        out.push("Include leadership or team collaboration experience");
    }
    if !has_any(skills, MODERN) {
        out.push("Consider learning modern development practices (Docker, TypeScript, CI/CD)");
    }
    out.into_iter()
        .take(MAX_SUGGESTIONS)
        .map(str::to_string)
        .collect()
}

/// How well a job's required skills are covered by a resume.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMatch {
    pub job_id: i64,
    pub title: String,
    pub company: Option<String>,
    /// Share of required skills covered, rounded to a whole percent.
    pub match_percent: u32,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
}

/// The best [`TOP_MATCHES`] jobs by skill coverage. Jobs with no overlap or
/// no listed skills are left out.
pub fn rank_jobs(skills: &[String], jobs: &[Job]) -> Vec<JobMatch> {
    let mut matches: Vec<JobMatch> = jobs
        .iter()
        .filter_map(|job| {
            let required = job.required_skills();
            if required.is_empty() {
                return None;
            }
            let (matched, missing): (Vec<String>, Vec<String>) = required
                .into_iter()
                .partition(|r| skills.iter().any(|s| s.eq_ignore_ascii_case(r)));
            if matched.is_empty() {
                return None;
            }
            let total = (matched.len() + missing.len()) as f64;
            let match_percent = (matched.len() as f64 * 100.0 / total).round() as u32;
            Some(JobMatch {
                job_id: job.id,
                title: job.title.clone(),
                company: job.company.clone(),
                match_percent,
                matched_skills: matched,
                missing_skills: missing,
            })
        })
        .collect();

    // stable: equal scores keep listing order
    matches.sort_by(|a, b| b.match_percent.cmp(&a.match_percent));
    matches.truncate(TOP_MATCHES);
    matches
}

/// Everything the heuristic derives from one resume.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeAnalysis {
    pub skills: Vec<String>,
    pub experience: String,
    pub summary: String,
    pub suggestions: Vec<String>,
    pub matching_jobs: Vec<JobMatch>,
}

pub fn analyze(text: &str, jobs: &[Job]) -> ResumeAnalysis {
    let skills = extract_skills(text);
    let experience = extract_experience(text);
    ResumeAnalysis {
        summary: summarize(&skills, &experience),
        suggestions: suggestions(&skills, text),
        matching_jobs: rank_jobs(&skills, jobs),
        experience,
        skills,
    }
}
