//! Field-level editing: apply JSON Patch ops to a draft, persist, and
//! optionally render the result.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::errors::AppError;
use crate::models::resume::ResumeRecord;
use crate::patch::{apply_patch, PatchOp};
use crate::pipeline::order::{enforce, SectionPolicy};
use crate::render::template;
use crate::routes::{expected_rev, flag, user_id};
use crate::state::AppState;
use crate::store::workspace::MetaPatch;
use crate::store::AutosaveMode;

#[derive(Debug, Deserialize)]
pub struct PatchRequest {
    /// Base document; the workspace draft is used when absent.
    #[serde(default)]
    pub base: Option<Value>,
    pub ops: Vec<PatchOp>,
    /// "none" | "tex" | "pdf" | "both"
    #[serde(default)]
    pub render: Option<String>,
}

/// POST /api/resume/patch
///
/// Applies the ops to the base (or the workspace draft), saves the result to
/// the workspace, then honors the autosave mode: overwrite the selected
/// version, or snapshot. `?snapshot=1&name=...` forces a snapshot either way.
pub async fn patch_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    Json(req): Json<PatchRequest>,
) -> Result<Json<Value>, AppError> {
    let uid = user_id(&headers);
    let rev = expected_rev(&headers)?;

    let workspace = state.store.workspace(&uid).await?;
    if let Some(expected) = rev {
        if expected != workspace.rev {
            return Err(AppError::RevConflict {
                server_rev: workspace.rev,
            });
        }
    }

    let base_rev = workspace.rev;
    let base = req.base.unwrap_or(workspace.data);
    let base = crate::store::normalize(&base)?;
    let updated = apply_patch(&base, &req.ops)?;

    // Save against the rev we read: the store rejects the write if another
    // save landed in between.
    let saved = state
        .store
        .save_workspace(&uid, &updated, Some(base_rev), MetaPatch::default())
        .await?;
    info!(uid, rev = saved.rev, ops = req.ops.len(), "patch applied");

    if saved.autosave_mode == AutosaveMode::OverwriteVersion {
        if let Some(vid) = &saved.selected_version_id {
            state.store.overwrite_version(&uid, vid, &saved.data).await?;
        }
    }
    let snapshot = if saved.autosave_mode == AutosaveMode::SnapshotOnSave
        || flag(params.get("snapshot"))
    {
        Some(
            state
                .store
                .save_version(&uid, &saved.data, params.get("name").cloned())
                .await?,
        )
    } else {
        None
    };

    let mut out = json!({
        "updated": saved.data,
        "rev": saved.rev,
        "updatedAt": saved.updated_at,
        "snapshot": snapshot,
    });

    let render_mode = req.render.as_deref().unwrap_or("none");
    if matches!(render_mode, "tex" | "pdf" | "both") {
        let record: ResumeRecord =
            serde_json::from_value(saved.data.clone()).map_err(|e| {
                AppError::Validation(format!("draft is not a valid resume record: {e}"))
            })?;
        let record = enforce(record, &SectionPolicy::standard());
        let tex = template::render(&record)?;

        if matches!(render_mode, "pdf" | "both") {
            let compiled = state.compiler.compile(&tex).await?;
            out["rendered_pdf_b64"] =
                Value::String(base64::engine::general_purpose::STANDARD.encode(compiled.pdf));
        }
        if matches!(render_mode, "tex" | "both") {
            out["rendered_tex"] = Value::String(tex);
        }
    }

    Ok(Json(out))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::HeaderValue;
    use serde_json::json;

    use super::*;
    use crate::config::Config;
    use crate::llm::testing::ScriptedLlm;
    use crate::render::compile::testing::ScriptedCompiler;
    use crate::store::Store;

    fn test_state(dir: &tempfile::TempDir) -> AppState {
        AppState {
            llm: Arc::new(ScriptedLlm::failing()),
            compiler: Arc::new(ScriptedCompiler::pages(vec![1])),
            store: Store::new(dir.path()),
            config: Config {
                gemini_api_key: "test-key".into(),
                data_dir: dir.path().display().to_string(),
                port: 0,
                rust_log: "info".into(),
                band_thresholds: Default::default(),
            },
        }
    }

    fn replace_op(path: &str, value: Value) -> PatchOp {
        serde_json::from_value(json!({"op": "replace", "path": path, "value": value})).unwrap()
    }

    #[tokio::test]
    async fn test_stale_rev_header_conflicts_without_writing() {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state(&tmp);
        state
            .store
            .save_workspace("demo", &json!({"first_name": "Ada"}), None, MetaPatch::default())
            .await
            .unwrap();

        let mut headers = HeaderMap::new();
        headers.insert("X-Resume-Rev", HeaderValue::from_static("0"));
        let req = PatchRequest {
            base: None,
            ops: vec![replace_op("/first_name", json!("Eve"))],
            render: None,
        };
        let err = patch_handler(
            State(state.clone()),
            headers,
            Query(HashMap::new()),
            Json(req),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::RevConflict { server_rev: 1 }));

        let ws = state.store.workspace("demo").await.unwrap();
        assert_eq!(ws.data["first_name"], "Ada");
    }

    #[tokio::test]
    async fn test_patch_saves_through_rev_check_and_bumps() {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state(&tmp);
        state
            .store
            .save_workspace("demo", &json!({"first_name": "Ada"}), None, MetaPatch::default())
            .await
            .unwrap();

        let mut headers = HeaderMap::new();
        headers.insert("X-Resume-Rev", HeaderValue::from_static("1"));
        let req = PatchRequest {
            base: None,
            ops: vec![replace_op("/first_name", json!("Eve"))],
            render: None,
        };
        let Json(out) = patch_handler(
            State(state.clone()),
            headers,
            Query(HashMap::new()),
            Json(req),
        )
        .await
        .unwrap();
        assert_eq!(out["rev"], 2);
        assert_eq!(out["updated"]["first_name"], "Eve");
    }
}
