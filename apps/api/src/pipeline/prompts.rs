//! Prompts for the pipeline's internal LLM calls (bullet top-up, new-item
//! extraction, skill-row classification).

/// Bullet top-up for a sparse entry. `{context}`, `{entry}`, `{existing}`,
/// `{need}` are substituted. Output format: one bullet per line, prefixed
/// with "- ".
pub const BULLET_TOPUP_PROMPT: &str = r#"You are filling out a resume entry with additional bullet points.

CRITICAL: Use ONLY facts present in the context below. Do NOT invent
employers, dates, tools, metrics, or results. If the context does not
support a bullet, write fewer bullets.

Entry:
{entry}

Existing bullets (do not repeat):
{existing}

Write up to {need} new bullet points. Return ONLY the bullets, one per
line, each line starting with "- ".

=== CONTEXT (the candidate's own resume text) ===
{context}
"#;

/// New-item extraction for content-poor resumes. `{raw_text}`, `{known}`
/// substituted. Strict JSON out.
pub const NEW_ITEMS_PROMPT: &str = r#"Scan the resume text below for projects or roles that are explicitly and
clearly present in the text but missing from the known list. Do NOT infer,
do NOT embellish, and do NOT include anything from the known list.

Known items (name or title @ company):
{known}

Return ONLY valid JSON, no fences, in this exact shape:
{"projects": [{"name": "...", "tech": "...", "summary": "...", "bullets": ["..."]}],
 "experience": [{"title": "...", "company": "...", "start_date": "...", "end_date": "...", "bullets": ["..."]}]}

Return at most 2 projects and at most 1 experience entry. Empty lists are
the correct answer when nothing new is clearly present.

=== RESUME TEXT ===
{raw_text}
"#;

/// Skill-row classification. `{raw_text}`, `{job_desc}` substituted.
pub const SKILL_ROWS_PROMPT: &str = r#"Classify the candidate's skills into three display rows.

Prefer skills supported by the resume text. You may include skills from the
job description only when they do not contradict the resume. Do not invent
proficiency the resume does not show.

Return ONLY valid JSON, no fences:
{"languages": ["..."], "tools_platforms": ["..."], "concepts": ["..."]}

=== RESUME TEXT ===
{raw_text}

=== JOB DESCRIPTION (may be empty) ===
{job_desc}
"#;
