//! Skill and experience extraction from free text.

use std::sync::OnceLock;

use regex::Regex;

/// Skills recognised in resume text, in reporting order.
pub const SKILLS_CATALOG: &[&str] = &[
    "JavaScript", "TypeScript", "React", "Vue", "Angular", "Node.js", "Express",
    "Python", "Django", "Flask", "Java", "Spring", "C++", "C#", ".NET",
    "PHP", "Laravel", "Ruby", "Rails", "Go", "Rust", "Swift", "Kotlin",
    "HTML", "CSS", "SASS", "LESS", "Bootstrap", "Tailwind", "Material-UI",
    "SQL", "MySQL", "PostgreSQL", "MongoDB", "Redis", "Firebase",
    "AWS", "Azure", "GCP", "Docker", "Kubernetes", "Jenkins", "CI/CD",
    "Git", "GitHub", "GitLab", "Jira", "Agile", "Scrum", "DevOps",
    "Machine Learning", "AI", "TensorFlow", "PyTorch", "Pandas", "NumPy",
    "React Native", "Flutter", "Xamarin", "iOS", "Android",
    "Photoshop", "Figma", "Sketch", "Adobe XD", "UI/UX", "Design",
];

pub const EXPERIENCE_UNSPECIFIED: &str = "Experience level not specified";

fn skill_patterns() -> &'static [(&'static str, Regex)] {
    static PATTERNS: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        SKILLS_CATALOG
            .iter()
            .map(|skill| {
                // a skill must not be glued to letters or digits on either side
                let pattern = format!(
                    r"(?i)(?:^|[^a-z0-9]){}(?:$|[^a-z0-9])",
                    regex::escape(skill)
                );
                let re = Regex::new(&pattern).expect("skill pattern is valid");
                (*skill, re)
            })
            .collect()
    })
}

/// Catalog skills mentioned in `text`, case-insensitive, in catalog order.
pub fn extract_skills(text: &str) -> Vec<String> {
    skill_patterns()
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(skill, _)| skill.to_string())
        .collect()
}

enum ExperienceRule {
    Years,
    Plus,
    Range,
    Senior,
    Junior,
    Intern,
}

fn experience_patterns() -> &'static [(ExperienceRule, Regex)] {
    static PATTERNS: OnceLock<Vec<(ExperienceRule, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (ExperienceRule::Years, r"(?i)(\d+)\s*(?:years?|yrs?)\s*(?:of\s*)?experience"),
            (ExperienceRule::Plus, r"(?i)(\d+)\+\s*(?:years?|yrs?)"),
            (ExperienceRule::Range, r"(?i)(\d+)\s*-\s*(\d+)\s*(?:years?|yrs?)"),
            (ExperienceRule::Senior, r"(?i)senior|lead|principal"),
            (ExperienceRule::Junior, r"(?i)junior|entry.?level|fresher|graduate"),
            (ExperienceRule::Intern, r"(?i)intern|internship"),
        ]
        .into_iter()
        .map(|(rule, pattern)| (rule, Regex::new(pattern).expect("experience pattern is valid")))
        .collect()
    })
}

fn years_bucket(years: u32) -> &'static str {
    match years {
        0..=2 => "0-2 years",
        3..=4 => "2-4 years",
        5..=7 => "5-7 years",
        _ => "7+ years",
    }
}

/// Experience level described by `text`. The first matching rule wins.
pub fn extract_experience(text: &str) -> String {
    for (rule, re) in experience_patterns() {
        let Some(caps) = re.captures(text) else {
            continue;
        };
        let group = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or_default();
        return match rule {
            ExperienceRule::Years => match group(1).parse::<u32>() {
                Ok(years) => years_bucket(years).to_string(),
                Err(_) => "7+ years".to_string(),
            },
            ExperienceRule::Plus => format!("{}+ years", group(1)),
            ExperienceRule::Range => format!("{}-{} years", group(1), group(2)),
            ExperienceRule::Senior => "5+ years (Senior level)".to_string(),
            ExperienceRule::Junior => "0-2 years (Junior level)".to_string(),
            ExperienceRule::Intern => "0-1 years (Intern level)".to_string(),
        };
    }
    EXPERIENCE_UNSPECIFIED.to_string()
}
