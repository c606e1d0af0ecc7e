//! Structured-data sanitizer: the trust boundary between LLM output and the
//! pipeline.
//!
//! Input is an arbitrarily-shaped JSON mapping. Output is a fully-populated
//! `ResumeRecord` with every scalar coerced to a string, every list filtered
//! to well-formed entries, and the extraction service's flat aliases
//! (city/region, linkedin/github/website, skills_* buckets) folded into the
//! canonical fields. Never fails — worst case is an empty record.

use serde_json::Value;

use crate::models::resume::{
    CertificationEntry, EducationEntry, ExperienceEntry, Link, ProjectEntry, ResumeRecord,
};
use crate::pipeline::certs::parse_certification;
use crate::pipeline::text::{clean_string_list, clean_value};

pub fn sanitize(raw: &Value) -> ResumeRecord {
    let obj = match raw.as_object() {
        Some(map) => map,
        None => return ResumeRecord::default(),
    };
    let get = |key: &str| obj.get(key);

    let mut record = ResumeRecord {
        first_name: clean_value(get("first_name")),
        last_name: clean_value(get("last_name")),
        email: clean_value(get("email")),
        phone: clean_value(get("phone")),
        location: clean_value(get("location")),
        summary: clean_value(get("summary")),
        skills: clean_string_list(get("skills")),
        skills_row1: clean_value(get("skills_row1")),
        skills_row2: clean_value(get("skills_row2")),
        skills_row3: clean_value(get("skills_row3")),
        publications: clean_string_list(get("publications")),
        show_summary: raw
            .get("show_summary")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        ..ResumeRecord::default()
    };

    // Flat alias: "City" + "Region" → "City, Region".
    if record.location.is_empty() {
        let city = clean_value(get("city"));
        let region = clean_value(get("region"));
        record.location = match (city.is_empty(), region.is_empty()) {
            (false, false) => format!("{city}, {region}"),
            (false, true) => city,
            (true, false) => region,
            (true, true) => String::new(),
        };
    }

    // Skill buckets from the extraction schema fold into the flat list.
    for bucket in [
        "skills_programming",
        "skills_tools",
        "skills_databases",
        "skills_concepts",
    ] {
        for skill in clean_string_list(get(bucket)) {
            if !record.skills.iter().any(|s| s.eq_ignore_ascii_case(&skill)) {
                record.skills.push(skill);
            }
        }
    }

    record.links = sanitize_links(get("links"));
    for (label, key) in [("LinkedIn", "linkedin"), ("GitHub", "github"), ("Website", "website")] {
        let url = clean_value(get(key));
        if !url.is_empty() && !record.has_link(&url) {
            record.links.push(Link {
                label: label.to_string(),
                url,
            });
        }
    }

    record.experience = dict_entries(get("experience"))
        .into_iter()
        .map(sanitize_experience)
        .collect();
    record.projects = dict_entries(get("projects"))
        .into_iter()
        .map(sanitize_project)
        .collect();
    record.education = dict_entries(get("education"))
        .into_iter()
        .map(sanitize_education)
        .collect();

    record.certifications = match get("certifications") {
        Some(Value::Array(items)) => items.iter().filter_map(parse_certification).collect(),
        _ => Vec::new(),
    };

    record.section_order = clean_string_list(get("section_order"));
    record
}

/// Keeps only well-formed dict entries; everything else is dropped.
fn dict_entries(value: Option<&Value>) -> Vec<&serde_json::Map<String, Value>> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_object).collect(),
        _ => Vec::new(),
    }
}

fn sanitize_links(value: Option<&Value>) -> Vec<Link> {
    let mut links: Vec<Link> = Vec::new();
    for entry in dict_entries(value) {
        let url = clean_value(entry.get("url"));
        if url.is_empty() || links.iter().any(|l| l.url == url) {
            continue;
        }
        links.push(Link {
            label: clean_value(entry.get("label")),
            url,
        });
    }
    links
}

fn sanitize_experience(entry: &serde_json::Map<String, Value>) -> ExperienceEntry {
    let mut title = clean_value(entry.get("title"));
    if title.is_empty() {
        title = clean_value(entry.get("role"));
    }
    let mut exp = ExperienceEntry {
        title,
        company: clean_value(entry.get("company")),
        location: clean_value(entry.get("location")),
        start_date: clean_value(entry.get("start_date")),
        end_date: clean_value(entry.get("end_date")),
        summary: clean_value(entry.get("summary")),
        bullets: clean_string_list(entry.get("bullets")),
    };
    normalize_present(&exp.start_date.clone(), &mut exp.end_date);
    exp
}

fn sanitize_project(entry: &serde_json::Map<String, Value>) -> ProjectEntry {
    let mut tech = clean_value(entry.get("tech"));
    if tech.is_empty() {
        tech = clean_string_list(entry.get("tech_stack")).join(", ");
    }
    ProjectEntry {
        name: clean_value(entry.get("name")),
        tech,
        link: clean_value(entry.get("link")),
        summary: clean_value(entry.get("summary")),
        start_date: clean_value(entry.get("start_date")),
        end_date: clean_value(entry.get("end_date")),
        bullets: clean_string_list(entry.get("bullets")),
    }
}

fn sanitize_education(entry: &serde_json::Map<String, Value>) -> EducationEntry {
    let mut year = clean_value(entry.get("graduation_year"));
    if year.is_empty() {
        year = clean_value(entry.get("end_date"));
    }
    let mut details = clean_string_list(entry.get("details"));
    for course in clean_string_list(entry.get("relevant_courses")) {
        if !details.contains(&course) {
            details.push(course);
        }
    }
    EducationEntry {
        degree: clean_value(entry.get("degree")),
        institution: clean_value(entry.get("institution")),
        location: clean_value(entry.get("location")),
        graduation_year: year,
        details,
    }
}

/// An open-ended date range is shown as "Present", explicitly.
fn normalize_present(start_date: &str, end_date: &mut String) {
    if end_date.is_empty() && !start_date.is_empty() {
        *end_date = "Present".to_string();
    }
}

/// Re-normalizes certifications already held as typed entries (used by the
/// compressor, which must be idempotent over its own output).
pub fn renormalize_certifications(certs: &[CertificationEntry]) -> Vec<CertificationEntry> {
    certs
        .iter()
        .filter_map(|c| parse_certification(&serde_json::to_value(c).unwrap_or(Value::Null)))
        .collect()
}
