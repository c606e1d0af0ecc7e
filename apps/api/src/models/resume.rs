//! Canonical in-flight resume representation.
//!
//! A `ResumeRecord` is created fresh per request from extraction output and
//! flows through the shaping pipeline as a value. It is never persisted
//! directly — only its JSON projection lands in the version/workspace store.

use serde::{Deserialize, Serialize};

/// A labeled URL. Links are unique by `url` throughout the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Link {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceEntry {
    pub title: String,
    pub company: String,
    pub location: String,
    pub start_date: String,
    /// Empty end_date + non-empty start_date normalizes to "Present" during
    /// sanitization, never left implicit for the renderer to guess.
    pub end_date: String,
    pub summary: String,
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectEntry {
    pub name: String,
    pub tech: String,
    pub link: String,
    pub summary: String,
    pub start_date: String,
    pub end_date: String,
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationEntry {
    pub degree: String,
    pub institution: String,
    pub location: String,
    pub graduation_year: String,
    /// Always non-empty after the enrichment pass; a neutral placeholder is
    /// injected when the source text yields nothing.
    pub details: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificationEntry {
    pub name: String,
    pub issuer: String,
    pub date: String,
    pub link: String,
    pub description: String,
}

impl CertificationEntry {
    /// Identity key for deduplication: name/issuer are case-insensitive.
    pub fn dedup_key(&self) -> (String, String, String, String) {
        (
            self.name.trim().to_lowercase(),
            self.issuer.trim().to_lowercase(),
            self.date.trim().to_string(),
            self.link.trim().to_string(),
        )
    }
}

/// The canonical resume record. All fields are always present; absence of
/// information is an empty string or empty list, never a missing key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeRecord {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub summary: String,
    pub links: Vec<Link>,
    pub skills: Vec<String>,
    pub skills_row1: String,
    pub skills_row2: String,
    pub skills_row3: String,
    pub experience: Vec<ExperienceEntry>,
    pub projects: Vec<ProjectEntry>,
    pub education: Vec<EducationEntry>,
    pub certifications: Vec<CertificationEntry>,
    pub publications: Vec<String>,
    pub show_summary: bool,
    pub section_order: Vec<String>,
}

impl ResumeRecord {
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            "Candidate".to_string()
        } else {
            name.to_string()
        }
    }

    /// True when a link with the same URL (exact match) is already present.
    pub fn has_link(&self, url: &str) -> bool {
        self.links.iter().any(|l| l.url == url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cert_dedup_key_case_insensitive() {
        let a = CertificationEntry {
            name: "AWS Certified".into(),
            issuer: "Amazon".into(),
            date: "2023".into(),
            link: "https://aws.example/cert".into(),
            description: "".into(),
        };
        let b = CertificationEntry {
            name: "aws certified".into(),
            issuer: "AMAZON".into(),
            ..a.clone()
        };
        assert_eq!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn test_full_name_fallback() {
        let r = ResumeRecord::default();
        assert_eq!(r.full_name(), "Candidate");
    }

    #[test]
    fn test_deserialize_partial_json() {
        let r: ResumeRecord = serde_json::from_str(r#"{"first_name":"Ada"}"#).unwrap();
        assert_eq!(r.first_name, "Ada");
        assert!(r.experience.is_empty());
        assert!(!r.show_summary);
    }
}
