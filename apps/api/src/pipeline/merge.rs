//! Merger: keyed union of a baseline record (from the original resume) with
//! an optimized record (from the LLM-rewritten resume).
//!
//! Optimized content wins, but missing fields are backfilled from the
//! baseline. Entire sections are never silently dropped: an optimizer that
//! returns zero experience entries falls back to the baseline list verbatim.

use serde_json::Value;

use crate::models::resume::{EducationEntry, ExperienceEntry, ProjectEntry, ResumeRecord};
use crate::pipeline::sanitize::sanitize;

/// Sanitizes both sides at the boundary, then merges.
pub fn merge(baseline: &Value, optimized: &Value) -> ResumeRecord {
    merge_records(sanitize(baseline), sanitize(optimized))
}

pub fn merge_records(baseline: ResumeRecord, optimized: ResumeRecord) -> ResumeRecord {
    let mut merged = optimized;

    for (dst, src) in [
        (&mut merged.first_name, &baseline.first_name),
        (&mut merged.last_name, &baseline.last_name),
        (&mut merged.email, &baseline.email),
        (&mut merged.phone, &baseline.phone),
        (&mut merged.location, &baseline.location),
        (&mut merged.summary, &baseline.summary),
    ] {
        if dst.is_empty() {
            *dst = src.clone();
        }
    }

    // Guard against the optimizer dropping skills: fewer than half of a
    // non-trivial baseline list means the baseline wins outright.
    if baseline.skills.len() >= 3 && merged.skills.len() * 2 < baseline.skills.len() {
        merged.skills = baseline.skills.clone();
    }

    merged.experience = merge_experience(&baseline.experience, merged.experience);
    merged.projects = merge_projects(&baseline.projects, merged.projects);
    merged.education = merge_education(&baseline.education, merged.education);

    // Links: set-union by url; label comes from whichever side contributes it.
    for link in &baseline.links {
        if !merged.has_link(&link.url) {
            merged.links.push(link.clone());
        }
    }

    if merged.certifications.is_empty() {
        merged.certifications = baseline.certifications.clone();
    }
    if merged.publications.is_empty() {
        merged.publications = baseline.publications.clone();
    }

    merged
}

fn experience_key(e: &ExperienceEntry) -> (String, String) {
    (e.title.to_lowercase(), e.company.to_lowercase())
}

/// Keyed by (title, company), case-insensitive. Optimized entries win but
/// inherit baseline bullets/summary when empty. Zero optimized entries means
/// the entire baseline list is used verbatim.
fn merge_experience(
    baseline: &[ExperienceEntry],
    optimized: Vec<ExperienceEntry>,
) -> Vec<ExperienceEntry> {
    if optimized.is_empty() {
        return baseline.to_vec();
    }
    let mut merged: Vec<ExperienceEntry> = optimized
        .into_iter()
        .map(|mut opt| {
            if let Some(base) = baseline.iter().find(|b| experience_key(b) == experience_key(&opt)) {
                if opt.bullets.is_empty() {
                    opt.bullets = base.bullets.clone();
                }
                if opt.summary.is_empty() {
                    opt.summary = base.summary.clone();
                }
                if opt.location.is_empty() {
                    opt.location = base.location.clone();
                }
                if opt.start_date.is_empty() {
                    opt.start_date = base.start_date.clone();
                }
                if opt.end_date.is_empty() {
                    opt.end_date = base.end_date.clone();
                }
            }
            opt
        })
        .collect();

    for base in baseline {
        if !merged.iter().any(|m| experience_key(m) == experience_key(base)) {
            merged.push(base.clone());
        }
    }
    merged
}

/// Keyed by name, case-insensitive; same inherit-when-empty policy as
/// experience. Baseline-only projects are appended after.
fn merge_projects(baseline: &[ProjectEntry], optimized: Vec<ProjectEntry>) -> Vec<ProjectEntry> {
    let mut merged: Vec<ProjectEntry> = optimized
        .into_iter()
        .map(|mut opt| {
            if let Some(base) = baseline
                .iter()
                .find(|b| b.name.eq_ignore_ascii_case(&opt.name))
            {
                if opt.bullets.is_empty() {
                    opt.bullets = base.bullets.clone();
                }
                if opt.summary.is_empty() {
                    opt.summary = base.summary.clone();
                }
                if opt.tech.is_empty() {
                    opt.tech = base.tech.clone();
                }
                if opt.link.is_empty() {
                    opt.link = base.link.clone();
                }
            }
            opt
        })
        .collect();

    for base in baseline {
        if !merged.iter().any(|m| m.name.eq_ignore_ascii_case(&base.name)) {
            merged.push(base.clone());
        }
    }
    merged
}

fn education_key(e: &EducationEntry) -> (String, String) {
    (e.degree.to_lowercase(), e.institution.to_lowercase())
}

/// Keyed by (degree, institution), case-insensitive. Optimized entries win
/// but inherit details/graduation_year/location when empty; unmatched
/// baseline entries are appended after.
fn merge_education(
    baseline: &[EducationEntry],
    optimized: Vec<EducationEntry>,
) -> Vec<EducationEntry> {
    let mut merged: Vec<EducationEntry> = optimized
        .into_iter()
        .map(|mut opt| {
            if let Some(base) = baseline.iter().find(|b| education_key(b) == education_key(&opt)) {
                if opt.details.is_empty() {
                    opt.details = base.details.clone();
                }
                if opt.graduation_year.is_empty() {
                    opt.graduation_year = base.graduation_year.clone();
                }
                if opt.location.is_empty() {
                    opt.location = base.location.clone();
                }
            }
            opt
        })
        .collect();

    for base in baseline {
        if !merged.iter().any(|m| education_key(m) == education_key(base)) {
            merged.push(base.clone());
        }
    }
    merged
}
