//! ContentExpander: tops up sparse records with additional LLM-generated
//! bullets, or new items for very thin resumes.
//!
//! Expansion is additive and idempotent: existing bullets are never touched,
//! and the top-up need is `target − current`, floored at zero. Every LLM
//! failure degrades to the summary-derived fallback or to no change at all.

use serde_json::Value;
use tracing::debug;

use crate::llm::service::parse_mapping;
use crate::llm::Llm;
use crate::models::resume::{ExperienceEntry, ProjectEntry, ResumeRecord};
use crate::pipeline::prompts::{BULLET_TOPUP_PROMPT, NEW_ITEMS_PROMPT};
use crate::pipeline::text::bullets_from_prose;
use crate::pipeline::{approx_char_count, Band, BandThresholds};

const MAX_NEW_PROJECTS: usize = 2;
const MAX_NEW_EXPERIENCE: usize = 1;

pub async fn expand(
    mut record: ResumeRecord,
    raw_text: &str,
    llm: &dyn Llm,
    thresholds: &BandThresholds,
) -> ResumeRecord {
    let band = Band::classify(approx_char_count(&record), thresholds);
    let target: usize = match band {
        Band::Short => 4,
        Band::Mid => 3,
        Band::Long => return record, // already content-rich
    };

    for i in 0..record.experience.len() {
        let entry = &record.experience[i];
        let need = target.saturating_sub(entry.bullets.len());
        if need == 0 {
            continue;
        }
        let context = experience_context(entry);
        let new = top_up(llm, raw_text, &context, &entry.bullets, &entry.summary, need).await;
        record.experience[i].bullets.extend(new);
    }

    for i in 0..record.projects.len() {
        let entry = &record.projects[i];
        let need = target.saturating_sub(entry.bullets.len());
        if need == 0 {
            continue;
        }
        let context = project_context(entry);
        let new = top_up(llm, raw_text, &context, &entry.bullets, &entry.summary, need).await;
        record.projects[i].bullets.extend(new);
    }

    // Still short after the top-up: ask for items the extraction missed.
    if matches!(
        Band::classify(approx_char_count(&record), thresholds),
        Band::Short
    ) && band == Band::Short
    {
        add_new_items(&mut record, raw_text, llm).await;
    }

    record
}

fn experience_context(entry: &ExperienceEntry) -> String {
    format!(
        "{} at {} ({} – {})\n{}",
        entry.title, entry.company, entry.start_date, entry.end_date, entry.summary
    )
}

fn project_context(entry: &ProjectEntry) -> String {
    format!("Project {} [{}]\n{}", entry.name, entry.tech, entry.summary)
}

/// One LLM top-up attempt, falling back to summary-derived bullets.
async fn top_up(
    llm: &dyn Llm,
    raw_text: &str,
    entry_context: &str,
    existing: &[String],
    summary: &str,
    need: usize,
) -> Vec<String> {
    let prompt = BULLET_TOPUP_PROMPT
        .replace("{context}", raw_text)
        .replace("{entry}", entry_context)
        .replace("{existing}", &existing.join("\n"))
        .replace("{need}", &need.to_string());

    let mut bullets = match llm.complete(&prompt).await {
        Ok(text) => parse_bullet_lines(&text, need),
        Err(e) => {
            debug!("bullet top-up call failed: {e}");
            Vec::new()
        }
    };
    bullets.retain(|b| !existing.iter().any(|e| e.eq_ignore_ascii_case(b)));

    if bullets.is_empty() && !summary.is_empty() {
        bullets = bullets_from_prose(summary, need);
        bullets.retain(|b| !existing.iter().any(|e| e.eq_ignore_ascii_case(b)));
    }
    bullets.truncate(need);
    bullets
}

/// Parses "- " prefixed lines from a top-up response. Unmarked responses are
/// unusable and yield nothing.
pub fn parse_bullet_lines(text: &str, max: usize) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            line.strip_prefix("- ")
                .or_else(|| line.strip_prefix("• "))
                .map(|b| b.trim().to_string())
        })
        .filter(|b| !b.is_empty())
        .take(max)
        .collect()
}

/// Requests up to 2 new projects and 1 new experience entry that are present
/// in the raw text but absent from the record's name/company set.
async fn add_new_items(record: &mut ResumeRecord, raw_text: &str, llm: &dyn Llm) {
    let known: Vec<String> = record
        .projects
        .iter()
        .map(|p| p.name.clone())
        .chain(
            record
                .experience
                .iter()
                .map(|e| format!("{} @ {}", e.title, e.company)),
        )
        .collect();

    let prompt = NEW_ITEMS_PROMPT
        .replace("{known}", &known.join("\n"))
        .replace("{raw_text}", raw_text);

    let mapping = match llm.complete(&prompt).await {
        Ok(text) => match parse_mapping(&text) {
            Some(m) => m,
            None => return,
        },
        Err(e) => {
            debug!("new-item extraction call failed: {e}");
            return;
        }
    };

    let projects = entries_of::<ProjectEntry>(mapping.get("projects"));
    for project in projects.into_iter().take(MAX_NEW_PROJECTS) {
        let name = project.name.trim();
        if name.is_empty()
            || record
                .projects
                .iter()
                .any(|p| p.name.eq_ignore_ascii_case(name))
        {
            continue;
        }
        record.projects.push(project);
    }

    let experience = entries_of::<ExperienceEntry>(mapping.get("experience"));
    for entry in experience.into_iter().take(MAX_NEW_EXPERIENCE) {
        if entry.title.trim().is_empty() && entry.company.trim().is_empty() {
            continue;
        }
        let duplicate = record.experience.iter().any(|e| {
            e.title.eq_ignore_ascii_case(&entry.title)
                && e.company.eq_ignore_ascii_case(&entry.company)
        });
        if !duplicate {
            record.experience.push(entry);
        }
    }
}

fn entries_of<T: serde::de::DeserializeOwned>(value: Option<&Value>) -> Vec<T> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter(|v| v.is_object())
            .filter_map(|v| serde_json::from_value(v.clone()).ok())
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedLlm;

    fn sparse_record() -> ResumeRecord {
        ResumeRecord {
            experience: vec![ExperienceEntry {
                title: "Engineer".into(),
                company: "Acme".into(),
                summary: "Responsible for shipping the billing service. Worked on the data layer migration project.".into(),
                bullets: vec!["Built X".into()],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn thresholds() -> BandThresholds {
        BandThresholds::default()
    }

    #[tokio::test]
    async fn test_short_band_tops_up_to_four() {
        let llm = ScriptedLlm::new(vec![
            Ok("- Cut deploy time by 40%\n- Led the on-call rotation\n- Mentored two juniors".to_string()),
            // New-item call after top-up: nothing new.
            Ok(r#"{"projects": [], "experience": []}"#.to_string()),
        ]);
        let record = expand(sparse_record(), "raw", &llm, &thresholds()).await;
        assert_eq!(record.experience[0].bullets.len(), 4);
        // Existing bullets are never modified (monotonicity).
        assert_eq!(record.experience[0].bullets[0], "Built X");
    }

    #[tokio::test]
    async fn test_fallback_derives_bullets_from_summary() {
        let llm = ScriptedLlm::failing();
        let record = expand(sparse_record(), "raw", &llm, &thresholds()).await;
        let bullets = &record.experience[0].bullets;
        assert!(bullets.len() > 1, "summary fallback should add bullets");
        assert!(bullets.iter().any(|b| b.starts_with("Shipping")));
    }

    #[tokio::test]
    async fn test_no_expansion_at_or_above_target() {
        let mut record = sparse_record();
        record.experience[0].bullets = vec![
            "a".into(),
            "b".into(),
            "c".into(),
            "d".into(),
            "e".into(),
        ];
        // Pad the record into the mid band so target is 3 < 5 bullets.
        record.summary = "x".repeat(2000);
        let llm = ScriptedLlm::failing();
        let out = expand(record.clone(), "raw", &llm, &thresholds()).await;
        assert_eq!(out.experience[0].bullets, record.experience[0].bullets);
    }

    #[tokio::test]
    async fn test_long_band_is_noop() {
        let mut record = sparse_record();
        record.summary = "x".repeat(3000);
        let llm = ScriptedLlm::failing();
        let out = expand(record.clone(), "raw", &llm, &thresholds()).await;
        assert_eq!(out, record);
    }

    #[tokio::test]
    async fn test_new_items_rejects_known_names() {
        // All entries are already at target, so the only call is the
        // new-item extraction: one known project, one genuinely new.
        let llm = ScriptedLlm::new(vec![Ok(
            r#"{"projects": [{"name": "Alpha", "summary": "dup"}, {"name": "Beta", "summary": "new"}], "experience": []}"#.to_string(),
        )]);
        let mut record = sparse_record();
        record.experience[0].bullets = vec!["a".into(), "b".into(), "c".into(), "d".into()];
        record.projects.push(ProjectEntry {
            name: "alpha".into(),
            bullets: vec!["x".into(), "y".into(), "z".into(), "w".into()],
            ..Default::default()
        });
        let out = expand(record, "raw", &llm, &thresholds()).await;
        let names: Vec<_> = out.projects.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "Beta"]);
    }

    #[test]
    fn test_parse_bullet_lines_requires_marker() {
        let text = "Here are your bullets:\n- First one\n• Second one\nThird without marker";
        assert_eq!(parse_bullet_lines(text, 5), vec!["First one", "Second one"]);
        assert!(parse_bullet_lines("no markers at all", 5).is_empty());
    }
}
