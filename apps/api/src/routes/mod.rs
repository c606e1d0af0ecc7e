pub mod chat;
pub mod health;
pub mod patch;
pub mod render;
pub mod resumes;
pub mod versions;
pub mod workspace;

use axum::http::HeaderMap;
use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::errors::AppError;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health_handler))
        // Extraction & tailoring
        .route("/api/resumes/extract", post(resumes::extract_handler))
        .route("/api/resumes/tailor", post(resumes::tailor_handler))
        .route("/api/resumes/tailor/json", post(resumes::tailor_json_handler))
        // Workspace draft
        .route("/api/workspace/get", get(workspace::get_handler))
        .route("/api/workspace/save", post(workspace::save_handler))
        .route("/api/workspace/snapshot", post(workspace::snapshot_handler))
        .route("/api/workspace/select", post(workspace::select_handler))
        .route("/api/workspace/mode", post(workspace::mode_handler))
        // Version snapshots
        .route("/api/versions/list", get(versions::list_handler))
        .route("/api/versions/load/:vid", get(versions::load_handler))
        .route("/api/versions/save", post(versions::save_handler))
        .route("/api/versions/overwrite/:vid", post(versions::overwrite_handler))
        .route("/api/versions/delete/:vid", delete(versions::delete_handler))
        // Field-level editing
        .route("/api/resume/patch", post(patch::patch_handler))
        // Standalone rendering of a posted record
        .route("/api/render/latex", post(render::latex_handler))
        .route("/api/render/pdf", post(render::pdf_handler))
        .route("/api/render/json", post(render::json_handler))
        // Assistant
        .route("/api/chat/complete", post(chat::complete_handler))
        .with_state(state)
}

/// Caller identity from the `X-User-Id` header. No authentication layer yet;
/// absent or unreadable headers fall back to the shared demo user.
pub fn user_id(headers: &HeaderMap) -> String {
    headers
        .get("X-User-Id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "demo".to_string())
}

/// Optional optimistic-concurrency revision from `X-Resume-Rev`.
pub fn expected_rev(headers: &HeaderMap) -> Result<Option<u64>, AppError> {
    match headers.get("X-Resume-Rev") {
        None => Ok(None),
        Some(v) => {
            let s = v
                .to_str()
                .map_err(|_| AppError::Validation("X-Resume-Rev must be an integer".into()))?;
            s.trim()
                .parse::<u64>()
                .map(Some)
                .map_err(|_| AppError::Validation("X-Resume-Rev must be an integer".into()))
        }
    }
}

/// Query flags arrive as strings; the frontend sends `snapshot=1`.
pub fn flag(value: Option<&String>) -> bool {
    matches!(
        value.map(|s| s.as_str()),
        Some("1") | Some("true") | Some("yes")
    )
}
