//! Version snapshot endpoints.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::routes::user_id;
use crate::state::AppState;
use crate::store::VersionMeta;

/// GET /api/versions/list
pub async fn list_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<VersionMeta>>, AppError> {
    let uid = user_id(&headers);
    Ok(Json(state.store.list_versions(&uid).await?))
}

/// GET /api/versions/load/:vid
pub async fn load_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(vid): Path<String>,
) -> Result<Json<Value>, AppError> {
    let uid = user_id(&headers);
    Ok(Json(state.store.load_version(&uid, &vid).await?))
}

/// POST /api/versions/save?name=...
pub async fn save_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    Json(data): Json<Value>,
) -> Result<Json<VersionMeta>, AppError> {
    let uid = user_id(&headers);
    let meta = state
        .store
        .save_version(&uid, &data, params.get("name").cloned())
        .await?;
    Ok(Json(meta))
}

/// POST /api/versions/overwrite/:vid
pub async fn overwrite_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(vid): Path<String>,
    Json(data): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let uid = user_id(&headers);
    state.store.overwrite_version(&uid, &vid, &data).await?;
    Ok(Json(json!({"ok": true, "id": vid})))
}

/// DELETE /api/versions/delete/:vid
pub async fn delete_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(vid): Path<String>,
) -> Result<Json<Value>, AppError> {
    let uid = user_id(&headers);
    state.store.delete_version(&uid, &vid).await?;
    Ok(Json(json!({"ok": true})))
}
