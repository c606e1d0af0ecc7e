//! Prompt constants for the request-boundary LLM calls.
//! Pipeline-internal prompts (bullet top-up, new-item extraction, skill
//! classification) live next to the stages that use them.

/// Structured extraction schema prompt. `{raw_text}` is substituted.
pub const EXTRACT_STRUCTURED_PROMPT: &str = r#"Extract a structured JSON object from the following resume text.

Return ONLY valid JSON (no markdown fences, no commentary). Use this schema:

{
  "first_name": "...",
  "last_name": "...",
  "phone": "...",
  "email": "...",
  "city": "...",
  "region": "...",
  "linkedin": "...",
  "github": "...",
  "website": "...",
  "summary": "...",
  "education": [
    {"institution": "...", "degree": "...", "location": "...",
     "graduation_year": "...", "details": ["..."]}
  ],
  "experience": [
    {"title": "...", "company": "...", "location": "...",
     "start_date": "...", "end_date": "...", "summary": "...", "bullets": ["..."]}
  ],
  "projects": [
    {"name": "...", "tech": "...", "link": "...", "summary": "...", "bullets": ["..."]}
  ],
  "skills": ["..."],
  "certifications": [
    {"name": "...", "issuer": "...", "date": "...", "link": "...", "description": "..."}
  ],
  "publications": ["..."]
}

Omit nothing that is present in the text; leave missing fields as empty
strings or empty lists.

=== RESUME TEXT ===
{raw_text}
"#;

/// Full-text rewrite prompt. `{resume_text}` and `{job_desc}` substituted.
pub const OPTIMIZE_PROMPT: &str = r#"You are an expert resume writer. Rewrite the resume below to align with the job description.
Keep it truthful (no invented experiences, employers, dates, tools, or results),
use quantified achievements where possible, and keep it ATS-friendly
(clean headings, bullet points).
Return ONLY the optimized resume text (no commentary).

=== ORIGINAL RESUME ===
{resume_text}

=== JOB DESCRIPTION ===
{job_desc}

=== OPTIMIZED RESUME (RETURN ONLY THIS) ===
"#;
