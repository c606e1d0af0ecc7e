//! High-level wrappers over the raw `Llm` seam for the request-boundary
//! calls: structured extraction, full-text optimization, and chat.
//!
//! Both degrade to "nothing known" (empty mapping / empty string) instead of
//! failing the request: the pipeline is designed to survive a non-responsive
//! or low-quality model.

use serde_json::Value;
use tracing::warn;

use crate::llm::prompts::{EXTRACT_STRUCTURED_PROMPT, OPTIMIZE_PROMPT};
use crate::llm::{extract_json_blob, strip_json_fences, Llm};

/// Extracts a best-effort structured mapping from resume text.
/// Returns an empty mapping on any failure — never an error.
pub async fn extract_structured(llm: &dyn Llm, raw_text: &str) -> Value {
    let prompt = EXTRACT_STRUCTURED_PROMPT.replace("{raw_text}", raw_text);
    let text = match llm.complete(&prompt).await {
        Ok(t) => t,
        Err(e) => {
            warn!("structured extraction failed: {e}");
            return Value::Object(Default::default());
        }
    };
    parse_mapping(&text).unwrap_or_else(|| {
        warn!("structured extraction returned unparseable output");
        Value::Object(Default::default())
    })
}

/// Rewrites the resume text against a job description.
/// Returns an empty string on failure.
pub async fn optimize(llm: &dyn Llm, resume_text: &str, job_desc: &str) -> String {
    let prompt = OPTIMIZE_PROMPT
        .replace("{resume_text}", resume_text)
        .replace("{job_desc}", job_desc);
    match llm.complete(&prompt).await {
        Ok(t) => t.trim().to_string(),
        Err(e) => {
            warn!("resume optimization failed: {e}");
            String::new()
        }
    }
}

/// Conversational reply, optionally grounded in the caller's current draft.
/// Degrades to a fixed apology line instead of failing the request.
pub async fn chat_reply(llm: &dyn Llm, message: &str, resume: Option<&Value>) -> String {
    let mut prompt = message.to_string();
    if let Some(resume) = resume {
        prompt.push_str("\n\nUser's current resume JSON:\n");
        prompt.push_str(&resume.to_string());
    }
    match llm.complete(&prompt).await {
        Ok(t) => t.trim().to_string(),
        Err(e) => {
            warn!("chat reply failed: {e}");
            "Sorry, I couldn't generate a response.".to_string()
        }
    }
}

/// Fence-stripped strict parse first, then the balanced-blob fallback.
/// Only mapping-shaped JSON counts.
pub fn parse_mapping(text: &str) -> Option<Value> {
    let stripped = strip_json_fences(text);
    if let Ok(v @ Value::Object(_)) = serde_json::from_str::<Value>(stripped) {
        return Some(v);
    }
    let blob = extract_json_blob(stripped)?;
    match serde_json::from_str::<Value>(blob) {
        Ok(v @ Value::Object(_)) => Some(v),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedLlm;
    use serde_json::json;

    #[tokio::test]
    async fn test_extract_structured_parses_fenced_json() {
        let llm = ScriptedLlm::new(vec![Ok(
            "```json\n{\"first_name\": \"Ada\"}\n```".to_string()
        )]);
        let v = extract_structured(&llm, "Ada Lovelace").await;
        assert_eq!(v, json!({"first_name": "Ada"}));
    }

    #[tokio::test]
    async fn test_extract_structured_empty_mapping_on_failure() {
        let llm = ScriptedLlm::failing();
        let v = extract_structured(&llm, "anything").await;
        assert_eq!(v, json!({}));
    }

    #[tokio::test]
    async fn test_extract_structured_empty_mapping_on_garbage() {
        let llm = ScriptedLlm::new(vec![Ok("I could not find any structure".to_string())]);
        let v = extract_structured(&llm, "anything").await;
        assert_eq!(v, json!({}));
    }

    #[tokio::test]
    async fn test_optimize_empty_string_on_failure() {
        let llm = ScriptedLlm::failing();
        assert_eq!(optimize(&llm, "resume", "jd").await, "");
    }

    #[tokio::test]
    async fn test_chat_reply_trims_model_output() {
        let llm = ScriptedLlm::new(vec![Ok("  Sure, here's a thought.  \n".to_string())]);
        let reply = chat_reply(&llm, "help me", None).await;
        assert_eq!(reply, "Sure, here's a thought.");
    }

    #[tokio::test]
    async fn test_chat_reply_apologizes_on_failure() {
        let llm = ScriptedLlm::failing();
        let reply = chat_reply(&llm, "help me", Some(&json!({"first_name": "Ada"}))).await;
        assert_eq!(reply, "Sorry, I couldn't generate a response.");
    }

    #[test]
    fn test_parse_mapping_rejects_non_objects() {
        assert!(parse_mapping("[1, 2, 3]").is_none());
        assert!(parse_mapping("42").is_none());
        assert!(parse_mapping("prose with {\"k\": 1} inside").is_some());
    }
}
