//! Enrichment pass: best-effort injectors that recover material the
//! extraction service missed from the original raw text.
//!
//! Every injector is independent, idempotent, and additive-only. Links are
//! the one exception to "never overwrite": they are unioned by URL.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::resume::{Link, ResumeRecord};
use crate::pipeline::text::truncate_chars;

static LINKEDIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)https?://(?:www\.)?linkedin\.com/in/[A-Za-z0-9_%-]+/?").unwrap()
});

static GITHUB_PROFILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)https?://(?:www\.)?github\.com/[A-Za-z0-9_-]+/?(?:$|[\s)\],])").unwrap()
});

static GITHUB_REPO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)https?://(?:www\.)?github\.com/[A-Za-z0-9_-]+/[A-Za-z0-9._-]+").unwrap()
});

/// `City, Region` token: capitalized word(s), comma, capitalized word.
static LOCATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z][a-z]+(?: [A-Z][a-z]+)?),\s+([A-Z][A-Za-z]+)\b").unwrap()
});

/// Runs every injector against the raw source text.
pub fn enrich(mut record: ResumeRecord, raw_text: &str) -> ResumeRecord {
    inject_profile_links(&mut record, raw_text);
    inject_location(&mut record, raw_text);
    inject_project_links(&mut record, raw_text);
    backfill_certification_descriptions(&mut record, raw_text);
    backfill_education_details(&mut record, raw_text);
    record
}

/// Appends LinkedIn/GitHub profile URLs found in the raw text that are not
/// already present by exact URL match.
fn inject_profile_links(record: &mut ResumeRecord, raw_text: &str) {
    if let Some(m) = LINKEDIN_RE.find(raw_text) {
        let url = m.as_str().trim_end_matches('/').to_string();
        if !record.has_link(&url) {
            record.links.push(Link {
                label: "LinkedIn".to_string(),
                url,
            });
        }
    }
    if let Some(m) = GITHUB_PROFILE_RE.find(raw_text) {
        let url = m
            .as_str()
            .trim_end_matches(|c: char| c.is_whitespace() || ")],".contains(c))
            .trim_end_matches('/')
            .to_string();
        if !record.has_link(&url) {
            record.links.push(Link {
                label: "GitHub".to_string(),
                url,
            });
        }
    }
}

/// Fills in the location only when it is empty.
fn inject_location(record: &mut ResumeRecord, raw_text: &str) {
    if !record.location.is_empty() {
        return;
    }
    if let Some(caps) = LOCATION_RE.captures(raw_text) {
        record.location = format!("{}, {}", &caps[1], &caps[2]);
    }
}

/// Assigns GitHub repo URLs found in the raw text, in order of appearance,
/// to projects lacking a link — first come, first served.
fn inject_project_links(record: &mut ResumeRecord, raw_text: &str) {
    let mut candidates: Vec<String> = Vec::new();
    for m in GITHUB_REPO_RE.find_iter(raw_text) {
        let url = m.as_str().trim_end_matches('/').to_string();
        if !candidates.contains(&url) {
            candidates.push(url);
        }
    }
    // URLs already claimed by some project keep their assignment.
    candidates.retain(|url| !record.projects.iter().any(|p| &p.link == url));

    let mut next = candidates.into_iter();
    for project in record.projects.iter_mut().filter(|p| p.link.is_empty()) {
        match next.next() {
            Some(url) => project.link = url,
            None => break,
        }
    }
}

/// For each certification missing a description, searches the raw text for a
/// window after the certification name up to a literal "Covered:" marker;
/// absent that, synthesizes a generic description.
fn backfill_certification_descriptions(record: &mut ResumeRecord, raw_text: &str) {
    for cert in record
        .certifications
        .iter_mut()
        .filter(|c| c.description.is_empty() && !c.name.is_empty())
    {
        if let Some(found) = covered_window(raw_text, &cert.name) {
            cert.description = truncate_chars(&found, 160);
        } else if !cert.issuer.is_empty() {
            cert.description = format!("Professional certification issued by {}.", cert.issuer);
        } else {
            cert.description = format!("Certification in {}.", cert.name.trim_end_matches('.'));
        }
    }
}

/// Text between the certification name and a "Covered:" marker, bounded to
/// the same neighborhood of the document.
fn covered_window(raw_text: &str, name: &str) -> Option<String> {
    let start = find_ci(raw_text, name)?;
    let after = &raw_text[start + name.len()..];
    let window = char_window(after, 400);
    let marker = find_ci(window, "covered:")?;
    let tail = window[marker + "covered:".len()..]
        .lines()
        .next()?
        .trim()
        .to_string();
    if tail.is_empty() {
        None
    } else {
        Some(tail)
    }
}

/// For each education entry lacking details, searches for a
/// "Coursework:"/"Subjects:" marker near the institution or degree; absent
/// that, synthesizes a one-line placeholder. Education details are never
/// empty after this pass.
fn backfill_education_details(record: &mut ResumeRecord, raw_text: &str) {
    for edu in record.education.iter_mut().filter(|e| e.details.is_empty()) {
        let anchor = if !edu.institution.is_empty() {
            edu.institution.as_str()
        } else {
            edu.degree.as_str()
        };
        if let Some(line) = coursework_line(raw_text, anchor) {
            edu.details.push(truncate_chars(&line, 200));
        } else if !edu.degree.is_empty() {
            edu.details
                .push(format!("Completed coursework toward {}.", edu.degree));
        } else {
            edu.details
                .push("Relevant coursework and academic projects.".to_string());
        }
    }
}

fn coursework_line(raw_text: &str, anchor: &str) -> Option<String> {
    if anchor.is_empty() {
        return None;
    }
    let start = find_ci(raw_text, anchor)?;
    let window = char_window(&raw_text[start..], 600);
    for marker in ["coursework:", "subjects:"] {
        if let Some(pos) = find_ci(window, marker) {
            let line = window[pos + marker.len()..].lines().next()?.trim();
            if !line.is_empty() {
                return Some(line.to_string());
            }
        }
    }
    None
}

/// A prefix of at most `max` bytes, clamped back to a char boundary.
fn char_window(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Case-insensitive substring search returning a byte offset.
fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    haystack
        .to_lowercase()
        .find(&needle.to_lowercase())
        // The lowercased offset is only safe to reuse when lengths match
        // (true for ASCII resumes; non-ASCII falls back to a direct scan).
        .filter(|_| haystack.len() == haystack.to_lowercase().len())
        .or_else(|| haystack.find(needle))
}
