//! SkillRowBuilder: classifies skills into three display rows (languages /
//! tools-and-platforms / concepts) with one LLM call.
//!
//! POLICY: there is no static fallback vocabulary. A failed or malformed
//! classification yields empty rows and preserves whatever flat skill list
//! the record already carried — hard-coded skill dictionaries leak canned
//! vocabulary into results and are deliberately absent.

use serde_json::Value;
use tracing::debug;

use crate::llm::service::parse_mapping;
use crate::llm::Llm;
use crate::pipeline::prompts::SKILL_ROWS_PROMPT;

/// Character budget per display row.
const ROW_CHAR_BUDGET: usize = 90;
/// Cap applied when preserving a pre-existing flat list.
const FLAT_SKILLS_CAP: usize = 12;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillRows {
    pub row1: String,
    pub row2: String,
    pub row3: String,
    pub flat: Vec<String>,
}

impl SkillRows {
    pub fn is_empty(&self) -> bool {
        self.row1.is_empty() && self.row2.is_empty() && self.row3.is_empty()
    }
}

pub async fn build_skill_rows(
    llm: &dyn Llm,
    raw_text: &str,
    job_desc: Option<&str>,
    existing: &[String],
) -> SkillRows {
    let prompt = SKILL_ROWS_PROMPT
        .replace("{raw_text}", raw_text)
        .replace("{job_desc}", job_desc.unwrap_or(""));

    let mapping = match llm.complete(&prompt).await {
        Ok(text) => parse_mapping(&text),
        Err(e) => {
            debug!("skill classification call failed: {e}");
            None
        }
    };

    let rows = mapping.map(rows_from_mapping).unwrap_or_default();
    if rows.is_empty() {
        // Preserve any pre-existing flat list rather than losing skills.
        return SkillRows {
            flat: existing.iter().take(FLAT_SKILLS_CAP).cloned().collect(),
            ..Default::default()
        };
    }
    rows
}

fn rows_from_mapping(mapping: Value) -> SkillRows {
    let languages = string_items(mapping.get("languages"));
    let tools = string_items(mapping.get("tools_platforms"));
    let concepts = string_items(mapping.get("concepts"));

    let mut flat: Vec<String> = Vec::new();
    for item in languages.iter().chain(tools.iter()).chain(concepts.iter()) {
        if !flat.iter().any(|s| s.eq_ignore_ascii_case(item)) {
            flat.push(item.clone());
        }
    }

    SkillRows {
        row1: join_within_budget(&languages, ROW_CHAR_BUDGET),
        row2: join_within_budget(&tools, ROW_CHAR_BUDGET),
        row3: join_within_budget(&concepts, ROW_CHAR_BUDGET),
        flat,
    }
}

fn string_items(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

/// Greedily joins items with ", " while staying under the budget. Items that
/// would overflow are dropped whole, never truncated mid-item.
fn join_within_budget(items: &[String], budget: usize) -> String {
    let mut row = String::new();
    for item in items {
        let added = if row.is_empty() {
            item.chars().count()
        } else {
            item.chars().count() + 2
        };
        if row.chars().count() + added > budget {
            continue;
        }
        if !row.is_empty() {
            row.push_str(", ");
        }
        row.push_str(item);
    }
    row
}
