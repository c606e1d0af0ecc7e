//! Text normalization primitives used by every pipeline stage.
//!
//! Upstream values come from an LLM and can be null, numbers, booleans, or
//! strings padded with filler prose. Everything funnels through here before
//! any shaping decision is made.

use serde_json::Value;

/// Tokens that mean "no information" regardless of casing.
const NONE_LIKE: &[&str] = &["none", "null", "n/a", "na", "-", "—", "–"];

/// Leading filler phrases stripped from derived bullets.
const FILLER_PREFIXES: &[&str] = &[
    "responsible for",
    "worked on",
    "tasked with",
    "duties included",
    "in charge of",
    "assisted with",
    "helped with",
    "helped",
];

/// Canonicalizes an arbitrary JSON value into a trimmed plain string.
/// Null and none-like tokens become the empty string; numbers and booleans
/// are rendered with their natural display form.
pub fn clean_value(value: Option<&Value>) -> String {
    let s = match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        // Nested structures are not meaningful as scalars; drop them.
        Some(Value::Array(_)) | Some(Value::Object(_)) => String::new(),
    };
    clean_str(&s)
}

/// Trims a string and clears none-like tokens to empty.
pub fn clean_str(s: &str) -> String {
    let trimmed = s.trim();
    if is_none_like(trimmed) {
        String::new()
    } else {
        trimmed.to_string()
    }
}

pub fn is_none_like(s: &str) -> bool {
    let lower = s.trim().to_lowercase();
    lower.is_empty() || NONE_LIKE.contains(&lower.as_str())
}

/// Truncates to at most `max` characters, appending an ellipsis when cut.
/// Operates on character boundaries, never mid-codepoint.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept.trim_end())
}

/// Strips a leading filler phrase ("responsible for", "worked on", ...) and
/// re-capitalizes the remainder. Applied when deriving bullets from prose.
pub fn strip_filler(s: &str) -> String {
    let trimmed = s.trim();
    let lower = trimmed.to_lowercase();
    for prefix in FILLER_PREFIXES {
        if lower.starts_with(prefix) {
            let rest = trimmed[prefix.len()..].trim_start_matches([' ', ':', ',']);
            return capitalize(rest);
        }
    }
    trimmed.to_string()
}

/// Extracts a list of cleaned, non-empty strings from a JSON value.
/// Non-array inputs yield a single-element list when the scalar is usable.
pub fn clean_string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| clean_value(Some(v)))
            .filter(|s| !s.is_empty())
            .collect(),
        other => {
            let s = clean_value(other);
            if s.is_empty() {
                Vec::new()
            } else {
                vec![s]
            }
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_uppercase().to_string() + chars.as_str(),
    }
}

/// Splits prose into bullet-sized fragments on sentence and clause
/// boundaries, stripping filler prefixes. Used as the non-LLM fallback when
/// topping up sparse entries.
pub fn bullets_from_prose(summary: &str, max: usize) -> Vec<String> {
    summary
        .split(['.', ';', '\n'])
        .map(|part| strip_filler(part.trim().trim_end_matches(',')))
        .filter(|part| part.chars().count() >= 12)
        .take(max)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clean_value_scalars() {
        assert_eq!(clean_value(Some(&json!("  hi "))), "hi");
        assert_eq!(clean_value(Some(&json!(2023))), "2023");
        assert_eq!(clean_value(Some(&json!(null))), "");
        assert_eq!(clean_value(None), "");
        assert_eq!(clean_value(Some(&json!({"a": 1}))), "");
    }

    #[test]
    fn test_none_like_tokens_cleared() {
        for token in ["None", "null", "N/A", "-", "—"] {
            assert_eq!(clean_str(token), "", "token {token:?} should clear");
        }
        assert_eq!(clean_str("Nonetheless"), "Nonetheless");
    }

    #[test]
    fn test_truncate_appends_ellipsis() {
        assert_eq!(truncate_chars("hello world", 6), "hello…");
        assert_eq!(truncate_chars("short", 10), "short");
    }

    #[test]
    fn test_strip_filler_recapitalizes() {
        assert_eq!(
            strip_filler("responsible for shipping the billing service"),
            "Shipping the billing service"
        );
        assert_eq!(strip_filler("Built the cache layer"), "Built the cache layer");
    }

    #[test]
    fn test_clean_string_list_filters_empties() {
        let v = json!(["Rust", "", "none", "Tokio"]);
        assert_eq!(clean_string_list(Some(&v)), vec!["Rust", "Tokio"]);
    }

    #[test]
    fn test_bullets_from_prose_splits_and_strips() {
        let prose = "Responsible for shipping the billing service. Worked on migrating the data layer to Postgres; led incident response.";
        let bullets = bullets_from_prose(prose, 4);
        assert_eq!(bullets[0], "Shipping the billing service");
        assert_eq!(bullets[1], "Migrating the data layer to Postgres");
        assert!(bullets.iter().all(|b| b.chars().count() >= 12));
    }
}
