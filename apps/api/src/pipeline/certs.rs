//! Certification normalization.
//!
//! Certifications arrive either as structured objects or as free-form strings
//! like `"AWS Certified | Amazon | 2023 | https://aws.example/cert"`. The
//! parser splits on the first separator found from an ordered preference list
//! and classifies the remaining segments by content sniffing.

use serde_json::Value;

use crate::models::resume::CertificationEntry;
use crate::pipeline::text::{clean_value, is_none_like, truncate_chars};

const MAX_DESCRIPTION_CHARS: usize = 160;

/// Separators tried in order; the first one present in the string wins.
const SEPARATORS: &[&str] = &["|", "•", " - ", "—", "–", ","];

/// Parses a certification from either a dict or a free-form string.
/// Returns `None` when no usable name can be recovered.
pub fn parse_certification(value: &Value) -> Option<CertificationEntry> {
    let entry = match value {
        Value::Object(map) => CertificationEntry {
            name: clean_value(map.get("name")),
            issuer: clean_value(map.get("issuer")),
            date: clean_value(map.get("date")),
            link: clean_value(map.get("link")),
            description: clean_value(map.get("description")),
        },
        Value::String(s) => parse_certification_str(s),
        _ => return None,
    };
    let entry = scrub(entry);
    if entry.name.is_empty() {
        None
    } else {
        Some(entry)
    }
}

/// Free-form parse: first segment is always the name; the rest are classified
/// in order — a 4-digit year claims the date slot once, an http(s) URL claims
/// the link slot once, the first unclassified segment becomes the issuer, and
/// everything else accumulates into the description.
pub fn parse_certification_str(raw: &str) -> CertificationEntry {
    let raw = raw.trim();
    let mut entry = CertificationEntry::default();
    if raw.is_empty() {
        return entry;
    }

    let segments: Vec<String> = match SEPARATORS.iter().find(|sep| raw.contains(**sep)) {
        Some(sep) => raw.split(sep).map(|s| s.trim().to_string()).collect(),
        None => vec![raw.to_string()],
    };

    let mut iter = segments.into_iter().filter(|s| !s.is_empty());
    entry.name = iter.next().unwrap_or_default();

    let mut description_parts: Vec<String> = Vec::new();
    for segment in iter {
        if entry.date.is_empty() && looks_like_year(&segment) {
            entry.date = segment;
        } else if entry.link.is_empty() && looks_like_url(&segment) {
            entry.link = segment;
        } else if entry.issuer.is_empty() && !looks_like_year(&segment) && !looks_like_url(&segment)
        {
            entry.issuer = segment;
        } else {
            description_parts.push(segment);
        }
    }
    entry.description = description_parts.join("; ");
    entry
}

/// Clears none-like tokens and applies per-field length caps.
fn scrub(mut entry: CertificationEntry) -> CertificationEntry {
    for field in [
        &mut entry.name,
        &mut entry.issuer,
        &mut entry.date,
        &mut entry.link,
        &mut entry.description,
    ] {
        if is_none_like(field) {
            field.clear();
        }
    }
    entry.description = truncate_chars(&entry.description, MAX_DESCRIPTION_CHARS);
    entry
}

/// A 4-digit year in 1900–2099, possibly embedded ("Mar 2024").
fn looks_like_year(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.windows(4).enumerate().any(|(i, w)| {
        w.iter().all(|b| b.is_ascii_digit())
            && (w[0] == b'1' && w[1] == b'9' || w[0] == b'2' && w[1] == b'0')
            // Reject longer digit runs (e.g. credential ids).
            && (i == 0 || !bytes[i - 1].is_ascii_digit())
            && (i + 4 == bytes.len() || !bytes[i + 4].is_ascii_digit())
    })
}

fn looks_like_url(s: &str) -> bool {
    let lower = s.to_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pipe_separated_full() {
        let c = parse_certification_str("AWS Certified | Amazon | 2023 | https://aws.example/cert");
        assert_eq!(c.name, "AWS Certified");
        assert_eq!(c.issuer, "Amazon");
        assert_eq!(c.date, "2023");
        assert_eq!(c.link, "https://aws.example/cert");
        assert_eq!(c.description, "");
    }

    #[test]
    fn test_em_dash_separated() {
        let c = parse_certification_str("CKA — CNCF — 2024");
        assert_eq!(c.name, "CKA");
        assert_eq!(c.issuer, "CNCF");
        assert_eq!(c.date, "2024");
    }

    #[test]
    fn test_date_claimed_once() {
        let c = parse_certification_str("Cert | 2021 | 2022");
        assert_eq!(c.date, "2021");
        // Second year is neither issuer (year-shaped) nor link: description.
        assert_eq!(c.description, "2022");
    }

    #[test]
    fn test_extra_segments_accumulate_into_description() {
        let c = parse_certification_str("Cert | Issuer | advanced track | covers IAM");
        assert_eq!(c.issuer, "Issuer");
        assert_eq!(c.description, "advanced track; covers IAM");
    }

    #[test]
    fn test_dict_input_with_none_like_tokens() {
        let c = parse_certification(&json!({
            "name": "GCP Architect",
            "issuer": "none",
            "date": "N/A",
            "link": "-",
            "description": "Cloud design"
        }))
        .unwrap();
        assert_eq!(c.issuer, "");
        assert_eq!(c.date, "");
        assert_eq!(c.link, "");
        assert_eq!(c.description, "Cloud design");
    }

    #[test]
    fn test_description_capped_at_160() {
        let long = "x".repeat(400);
        let c = parse_certification(&json!({ "name": "Cert", "description": long })).unwrap();
        assert!(c.description.chars().count() <= 160);
        assert!(c.description.ends_with('…'));
    }

    #[test]
    fn test_nameless_input_rejected() {
        assert!(parse_certification(&json!({"issuer": "Someone"})).is_none());
        assert!(parse_certification(&json!(42)).is_none());
    }

    #[test]
    fn test_year_detection_bounds() {
        assert!(looks_like_year("2099"));
        assert!(looks_like_year("Mar 1999"));
        assert!(!looks_like_year("2100"));
        assert!(!looks_like_year("12023"));
        assert!(!looks_like_year("abcd"));
    }
}
