//! Standalone rendering of a posted record: LaTeX source, compiled PDF, or
//! a normalized JSON export. No fit loop here — callers get exactly the
//! document they posted.

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::AppError;
use crate::models::resume::ResumeRecord;
use crate::pipeline::order::{enforce, SectionPolicy};
use crate::render::template;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub form: Value,
    /// "standard" (default) or "compact", which renders without the
    /// experience and publications sections.
    #[serde(default)]
    pub variant: Option<String>,
}

fn policy_for(variant: Option<&str>) -> Result<SectionPolicy, AppError> {
    match variant.unwrap_or("standard") {
        "standard" => Ok(SectionPolicy::standard()),
        "compact" => Ok(SectionPolicy::compact()),
        other => Err(AppError::Validation(format!(
            "unknown render variant '{other}'"
        ))),
    }
}

/// Normalizes the posted form and enforces the requested section policy.
fn normalized_record(req: &RenderRequest) -> Result<ResumeRecord, AppError> {
    let normalized = crate::store::normalize(&req.form)?;
    let record: ResumeRecord = serde_json::from_value(normalized)
        .map_err(|e| AppError::Validation(format!("body is not a valid resume record: {e}")))?;
    Ok(enforce(record, &policy_for(req.variant.as_deref())?))
}

fn attachment(content_type: &str, filename: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

/// POST /api/render/latex
pub async fn latex_handler(Json(req): Json<RenderRequest>) -> Result<Response, AppError> {
    let record = normalized_record(&req)?;
    let tex = template::render(&record)?;
    Ok(attachment("application/x-tex", "resume.tex", tex.into_bytes()))
}

/// POST /api/render/pdf
pub async fn pdf_handler(
    State(state): State<AppState>,
    Json(req): Json<RenderRequest>,
) -> Result<Response, AppError> {
    let record = normalized_record(&req)?;
    let tex = template::render(&record)?;
    let compiled = state.compiler.compile(&tex).await?;
    Ok(attachment("application/pdf", "resume.pdf", compiled.pdf))
}

/// POST /api/render/json
pub async fn json_handler(Json(req): Json<RenderRequest>) -> Result<Response, AppError> {
    let record = normalized_record(&req)?;
    let payload = serde_json::to_vec_pretty(&record).map_err(anyhow::Error::from)?;
    Ok(attachment("application/json", "resume.json", payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(variant: Option<&str>) -> RenderRequest {
        RenderRequest {
            form: json!({
                "first_name": "Ada",
                "summary": "Backend engineer.",
                "skills": ["Rust"],
                "experience": [{"title": "Engineer", "company": "Acme"}],
                "publications": ["Paper"],
            }),
            variant: variant.map(str::to_string),
        }
    }

    #[test]
    fn test_standard_variant_keeps_all_sections() {
        let record = normalized_record(&request(None)).unwrap();
        assert!(!record.experience.is_empty());
        assert!(record.section_order.contains(&"publications".to_string()));
    }

    #[test]
    fn test_compact_variant_drops_experience_and_publications() {
        let record = normalized_record(&request(Some("compact"))).unwrap();
        assert!(record.experience.is_empty());
        assert!(record.publications.is_empty());
        assert!(!record.section_order.contains(&"experience".to_string()));
    }

    #[test]
    fn test_unknown_variant_rejected() {
        let err = normalized_record(&request(Some("poster"))).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_normalized_record_renders() {
        let record = normalized_record(&request(None)).unwrap();
        let tex = template::render(&record).unwrap();
        assert!(tex.contains("Backend engineer."));
    }
}
