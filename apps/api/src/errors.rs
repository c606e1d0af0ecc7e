use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extract::ExtractError;
use crate::patch::PatchError;
use crate::render::compile::CompileError;
use crate::render::fit::FitError;
use crate::render::template::TemplateError;
use crate::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Document contains no extractable text")]
    EmptyDocument,

    #[error("Document does not permit text extraction")]
    ExtractionDenied,

    #[error("Template error at line {line}: {message}")]
    Template { line: usize, message: String },

    #[error("Workspace revision conflict (server rev {server_rev})")]
    RevConflict { server_rev: u64 },

    #[error("No LaTeX engine available")]
    CompilerUnavailable,

    #[error("Document compilation failed")]
    CompilationFailed { log: String },

    #[error("Content cannot be reduced to a single page")]
    FitExhausted,

    #[error("Storage error: {0}")]
    Store(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Two variants carry extra structured fields clients rely on; the
        // rest share the uniform envelope.
        match &self {
            AppError::RevConflict { server_rev } => {
                let body = Json(json!({
                    "error": {
                        "code": "REV_CONFLICT",
                        "message": self.to_string(),
                    },
                    "serverRev": server_rev,
                }));
                return (StatusCode::CONFLICT, body).into_response();
            }
            AppError::CompilationFailed { log } => {
                tracing::error!("compilation failed");
                let body = Json(json!({
                    "error": {
                        "code": "COMPILATION_FAILED",
                        "message": "Document compilation failed",
                    },
                    "log": log,
                }));
                return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
            }
            _ => {}
        }

        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnsupportedFormat(msg) => (
                StatusCode::BAD_REQUEST,
                "UNSUPPORTED_FORMAT",
                msg.clone(),
            ),
            AppError::EmptyDocument => (
                StatusCode::BAD_REQUEST,
                "EMPTY_DOCUMENT",
                "The document contains no extractable text".to_string(),
            ),
            AppError::ExtractionDenied => (
                StatusCode::BAD_REQUEST,
                "EXTRACTION_DENIED",
                "The document does not permit text extraction".to_string(),
            ),
            AppError::Template { line, message } => (
                StatusCode::BAD_REQUEST,
                "TEMPLATE_ERROR",
                format!("line {line}: {message}"),
            ),
            AppError::FitExhausted => (
                StatusCode::BAD_REQUEST,
                "FIT_EXHAUSTED",
                "Content cannot be reduced to a single page".to_string(),
            ),
            AppError::CompilerUnavailable => {
                tracing::error!("no LaTeX engine on PATH");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "COMPILER_UNAVAILABLE",
                    "No LaTeX engine is available on this server".to_string(),
                )
            }
            AppError::Store(msg) => {
                tracing::error!("storage error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
            // Handled above.
            AppError::RevConflict { .. } | AppError::CompilationFailed { .. } => unreachable!(),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

impl From<ExtractError> for AppError {
    fn from(e: ExtractError) -> Self {
        match e {
            ExtractError::UnsupportedFormat(msg) => AppError::UnsupportedFormat(msg),
            ExtractError::EmptyDocument => AppError::EmptyDocument,
            ExtractError::ExtractionDenied => AppError::ExtractionDenied,
            ExtractError::Malformed(msg) => {
                AppError::Validation(format!("document could not be parsed: {msg}"))
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::VersionNotFound => AppError::NotFound("Version not found".into()),
            StoreError::InvalidVersionId => AppError::Validation("invalid version id".into()),
            StoreError::RevConflict { server_rev } => AppError::RevConflict { server_rev },
            StoreError::Io(e) => AppError::Store(e.to_string()),
            StoreError::Serde(e) => AppError::Store(e.to_string()),
        }
    }
}

impl From<PatchError> for AppError {
    fn from(e: PatchError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl From<TemplateError> for AppError {
    fn from(e: TemplateError) -> Self {
        AppError::Template {
            line: e.line,
            message: e.message,
        }
    }
}

impl From<CompileError> for AppError {
    fn from(e: CompileError) -> Self {
        match e {
            CompileError::EngineUnavailable => AppError::CompilerUnavailable,
            CompileError::Failed { log, .. } => AppError::CompilationFailed { log },
            CompileError::Io(e) => AppError::Store(e.to_string()),
        }
    }
}

impl From<FitError> for AppError {
    fn from(e: FitError) -> Self {
        match e {
            FitError::Template(t) => t.into(),
            FitError::Compile(c) => c.into(),
            FitError::Exhausted { .. } => AppError::FitExhausted,
        }
    }
}
