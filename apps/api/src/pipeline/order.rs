//! SectionOrderEnforcer: fixes final section presence and order.
//!
//! Pure, total, idempotent. The canonical order is declared once; sections a
//! policy disallows are cleared outright (some entry points drop experience
//! or publications entirely), and `section_order` never contains a name
//! outside the canonical set.

use crate::models::resume::ResumeRecord;

pub const CANONICAL_SECTIONS: &[&str] = &[
    "summary",
    "links",
    "skills",
    "experience",
    "projects",
    "education",
    "certifications",
    "publications",
];

/// Which canonical sections an entry point renders.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionPolicy {
    allowed: Vec<&'static str>,
}

impl SectionPolicy {
    /// All canonical sections.
    pub fn standard() -> Self {
        Self {
            allowed: CANONICAL_SECTIONS.to_vec(),
        }
    }

    /// Compact variant used by entry points that render without the
    /// experience and publications sections.
    pub fn compact() -> Self {
        Self {
            allowed: CANONICAL_SECTIONS
                .iter()
                .copied()
                .filter(|s| *s != "experience" && *s != "publications")
                .collect(),
        }
    }

    pub fn allows(&self, section: &str) -> bool {
        self.allowed.contains(&section)
    }
}

pub fn enforce(mut record: ResumeRecord, policy: &SectionPolicy) -> ResumeRecord {
    // Disallowed sections are dropped, not merely hidden.
    if !policy.allows("summary") {
        record.summary.clear();
    }
    if !policy.allows("links") {
        record.links.clear();
    }
    if !policy.allows("skills") {
        record.skills.clear();
        record.skills_row1.clear();
        record.skills_row2.clear();
        record.skills_row3.clear();
    }
    if !policy.allows("experience") {
        record.experience.clear();
    }
    if !policy.allows("projects") {
        record.projects.clear();
    }
    if !policy.allows("education") {
        record.education.clear();
    }
    if !policy.allows("certifications") {
        record.certifications.clear();
    }
    if !policy.allows("publications") {
        record.publications.clear();
    }

    record.show_summary = !record.summary.trim().is_empty();

    record.section_order = CANONICAL_SECTIONS
        .iter()
        .filter(|s| policy.allows(s))
        .filter(|s| has_content(&record, s))
        .map(|s| s.to_string())
        .collect();
    record
}

fn has_content(record: &ResumeRecord, section: &str) -> bool {
    match section {
        "summary" => record.show_summary,
        "links" => !record.links.is_empty(),
        "skills" => {
            !record.skills.is_empty()
                || !record.skills_row1.is_empty()
                || !record.skills_row2.is_empty()
                || !record.skills_row3.is_empty()
        }
        "experience" => !record.experience.is_empty(),
        "projects" => !record.projects.is_empty(),
        "education" => !record.education.is_empty(),
        "certifications" => !record.certifications.is_empty(),
        "publications" => !record.publications.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{ExperienceEntry, ProjectEntry};

    fn sample() -> ResumeRecord {
        ResumeRecord {
            summary: "A backend engineer.".into(),
            skills: vec!["Rust".into()],
            experience: vec![ExperienceEntry {
                title: "Engineer".into(),
                ..Default::default()
            }],
            projects: vec![ProjectEntry {
                name: "cli".into(),
                ..Default::default()
            }],
            publications: vec!["Paper".into()],
            section_order: vec!["bogus".into(), "experience".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_enforce_idempotent() {
        let once = enforce(sample(), &SectionPolicy::standard());
        let twice = enforce(once.clone(), &SectionPolicy::standard());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_order_follows_canonical_sequence() {
        let out = enforce(sample(), &SectionPolicy::standard());
        assert_eq!(
            out.section_order,
            vec!["summary", "skills", "experience", "projects", "publications"]
        );
    }

    #[test]
    fn test_no_non_canonical_names_survive() {
        let out = enforce(sample(), &SectionPolicy::standard());
        assert!(out
            .section_order
            .iter()
            .all(|s| CANONICAL_SECTIONS.contains(&s.as_str())));
    }

    #[test]
    fn test_show_summary_recomputed_from_presence() {
        let mut r = sample();
        r.show_summary = false;
        let out = enforce(r, &SectionPolicy::standard());
        assert!(out.show_summary);

        let mut r = sample();
        r.summary = "  ".into();
        let out = enforce(r, &SectionPolicy::standard());
        assert!(!out.show_summary);
        assert!(!out.section_order.contains(&"summary".to_string()));
    }

    #[test]
    fn test_compact_policy_drops_experience_and_publications() {
        let out = enforce(sample(), &SectionPolicy::compact());
        assert!(out.experience.is_empty());
        assert!(out.publications.is_empty());
        assert!(!out.section_order.contains(&"experience".to_string()));
        assert!(!out.section_order.contains(&"publications".to_string()));
    }
}
