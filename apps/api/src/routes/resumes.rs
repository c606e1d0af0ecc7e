//! Upload, extraction, and tailoring endpoints.

use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::extract;
use crate::models::resume::ResumeRecord;
use crate::pipeline::order::SectionPolicy;
use crate::pipeline::{self, sanitize};
use crate::render::fit_to_page;
use crate::state::AppState;

struct Upload {
    bytes: Vec<u8>,
    content_type: Option<String>,
    filename: Option<String>,
    job_desc: String,
}

/// Pulls the document (field `file`) and optional `job_desc` text field out
/// of a multipart body.
async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    let mut upload = Upload {
        bytes: Vec::new(),
        content_type: None,
        filename: None,
        job_desc: String::new(),
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?
    {
        match field.name().unwrap_or("") {
            "file" => {
                upload.content_type = field.content_type().map(str::to_string);
                upload.filename = field.file_name().map(str::to_string);
                upload.bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("failed to read upload: {e}")))?
                    .to_vec();
            }
            "job_desc" => {
                upload.job_desc = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("failed to read job_desc: {e}")))?;
            }
            _ => {}
        }
    }

    if upload.bytes.is_empty() {
        return Err(AppError::Validation("missing 'file' field".into()));
    }
    Ok(upload)
}

/// POST /api/resumes/extract
/// Multipart upload → structured, sanitized, enriched record JSON.
pub async fn extract_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ResumeRecord>, AppError> {
    let upload = read_upload(multipart).await?;
    let raw_text = extract::extract_text(
        &upload.bytes,
        upload.content_type.as_deref(),
        upload.filename.as_deref(),
    )?;
    info!(chars = raw_text.len(), "extracted document text");

    let value = crate::llm::service::extract_structured(state.llm.as_ref(), &raw_text).await;
    let record = crate::pipeline::enrich::enrich(sanitize::sanitize(&value), &raw_text);
    Ok(Json(record))
}

/// POST /api/resumes/tailor
/// Multipart upload + job_desc → single-page tailored PDF.
pub async fn tailor_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let upload = read_upload(multipart).await?;
    if upload.job_desc.trim().is_empty() {
        return Err(AppError::Validation("missing 'job_desc' field".into()));
    }
    let raw_text = extract::extract_text(
        &upload.bytes,
        upload.content_type.as_deref(),
        upload.filename.as_deref(),
    )?;
    tailor_to_pdf(&state, &raw_text, &upload.job_desc).await
}

#[derive(Debug, Deserialize)]
pub struct TailorJsonRequest {
    pub resume_text: String,
    pub job_desc: String,
}

/// POST /api/resumes/tailor/json
/// Same pipeline, raw text already in hand.
pub async fn tailor_json_handler(
    State(state): State<AppState>,
    Json(req): Json<TailorJsonRequest>,
) -> Result<Response, AppError> {
    if req.resume_text.trim().is_empty() {
        return Err(AppError::Validation("resume_text must not be empty".into()));
    }
    if req.job_desc.trim().is_empty() {
        return Err(AppError::Validation("job_desc must not be empty".into()));
    }
    tailor_to_pdf(&state, &req.resume_text, &req.job_desc).await
}

async fn tailor_to_pdf(
    state: &AppState,
    raw_text: &str,
    job_desc: &str,
) -> Result<Response, AppError> {
    let policy = SectionPolicy::standard();
    let record = pipeline::tailor(
        raw_text,
        job_desc,
        state.llm.as_ref(),
        &state.config.band_thresholds,
        &policy,
    )
    .await;

    let fitted = fit_to_page(record, state.compiler.as_ref(), &policy).await?;
    info!(attempts = fitted.attempts, bytes = fitted.pdf.len(), "tailored PDF ready");

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"tailored_resume.pdf\"",
            ),
        ],
        fitted.pdf,
    )
        .into_response())
}
