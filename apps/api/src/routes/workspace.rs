//! Workspace draft endpoints: the mutable "current" document plus its
//! autosave/selection metadata.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::routes::{expected_rev, flag, user_id};
use crate::state::AppState;
use crate::store::workspace::MetaPatch;
use crate::store::{AutosaveMode, WorkspaceState};

/// GET /api/workspace/get
pub async fn get_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<WorkspaceState>, AppError> {
    let uid = user_id(&headers);
    Ok(Json(state.store.workspace(&uid).await?))
}

/// POST /api/workspace/save
/// Saves the draft (bumping rev); `X-Resume-Rev` enables optimistic
/// concurrency; `?snapshot=1&name=...` also snapshots the saved state.
pub async fn save_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    Json(data): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let uid = user_id(&headers);
    let rev = expected_rev(&headers)?;

    let saved = state
        .store
        .save_workspace(&uid, &data, rev, MetaPatch::default())
        .await?;

    let snapshot = if flag(params.get("snapshot")) {
        let meta = state
            .store
            .save_version(&uid, &saved.data, params.get("name").cloned())
            .await?;
        Some(meta)
    } else {
        None
    };

    Ok(Json(json!({
        "rev": saved.rev,
        "updatedAt": saved.updated_at,
        "snapshot": snapshot,
        "selectedVersionId": saved.selected_version_id,
        "autosaveMode": saved.autosave_mode,
    })))
}

/// POST /api/workspace/snapshot
pub async fn snapshot_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, AppError> {
    let uid = user_id(&headers);
    let current = state.store.workspace(&uid).await?;
    let meta = state
        .store
        .save_version(&uid, &current.data, params.get("name").cloned())
        .await?;
    Ok(Json(json!({
        "snapshot": meta,
        "rev": current.rev,
        "updatedAt": current.updated_at,
    })))
}

/// POST /api/workspace/select
/// Loads a version into the workspace and marks it selected; without a
/// `version_id` the selection is cleared and the draft kept.
pub async fn select_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, AppError> {
    let uid = user_id(&headers);
    let vid = params.get("version_id").map(String::as_str);
    let saved = state.store.select_version(&uid, vid).await?;
    Ok(Json(json!({
        "ok": true,
        "selectedVersionId": saved.selected_version_id,
        "rev": saved.rev,
        "updatedAt": saved.updated_at,
        "autosaveMode": saved.autosave_mode,
    })))
}

/// POST /api/workspace/mode?mode=workspace|overwrite_version|snapshot_on_save
pub async fn mode_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, AppError> {
    let uid = user_id(&headers);
    let mode = params
        .get("mode")
        .and_then(|m| AutosaveMode::parse(m))
        .ok_or_else(|| {
            AppError::Validation(
                "mode must be one of workspace, overwrite_version, snapshot_on_save".into(),
            )
        })?;
    let saved = state.store.set_autosave_mode(&uid, mode).await?;
    Ok(Json(json!({
        "ok": true,
        "autosaveMode": saved.autosave_mode,
        "rev": saved.rev,
        "updatedAt": saved.updated_at,
        "selectedVersionId": saved.selected_version_id,
    })))
}
