//! Per-user persistence under `DATA_DIR`.
//!
//! Layout: `<root>/<uid>/current.json` + `current.meta.json` hold the live
//! workspace draft; `<root>/<uid>/<version-id>.json` files are immutable
//! snapshots indexed by `index.json`. Everything written here is normalized
//! first, so a hand-edited or stale file can never poison a later read.

pub mod versions;
pub mod workspace;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::pipeline::sanitize;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("version not found")]
    VersionNotFound,
    #[error("invalid version id")]
    InvalidVersionId,
    #[error("workspace revision conflict")]
    RevConflict { server_rev: u64 },
}

/// What happens to versions when the workspace is saved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutosaveMode {
    /// Only the workspace draft is updated.
    #[default]
    Workspace,
    /// The selected version file is overwritten too.
    OverwriteVersion,
    /// Every save also creates a snapshot.
    SnapshotOnSave,
}

impl AutosaveMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "workspace" => Some(Self::Workspace),
            "overwrite_version" => Some(Self::OverwriteVersion),
            "snapshot_on_save" => Some(Self::SnapshotOnSave),
            _ => None,
        }
    }
}

/// One row of a user's `index.json`, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionMeta {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

/// The workspace draft plus its metadata, as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceState {
    pub rev: u64,
    pub updated_at: Option<String>,
    pub data: Value,
    pub selected_version_id: Option<String>,
    pub autosave_mode: AutosaveMode,
}

#[derive(Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Per-user directory, created on demand. The uid comes from a header,
    /// so it is restricted to a conservative character set before it touches
    /// the filesystem.
    pub(crate) async fn user_dir(&self, uid: &str) -> Result<PathBuf, StoreError> {
        let safe: String = uid
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            .collect();
        let safe = if safe.is_empty() || safe.starts_with('.') {
            "demo".to_string()
        } else {
            safe
        };
        let dir = self.root.join(safe);
        tokio::fs::create_dir_all(&dir).await?;
        Ok(dir)
    }
}

/// Re-normalizes an arbitrary JSON payload into the canonical record shape
/// before it is persisted or handed back to a client.
pub(crate) fn normalize(data: &Value) -> Result<Value, StoreError> {
    Ok(serde_json::to_value(sanitize::sanitize(data))?)
}
