//! The live workspace draft: `current.json` + `current.meta.json`.
//!
//! `rev` is strictly increasing and bumps on every successful write. A
//! caller that supplies an expected rev gets a conflict back (and an
//! untouched store) when it no longer matches.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::{normalize, AutosaveMode, Store, StoreError, WorkspaceState};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WorkspaceMeta {
    rev: u64,
    updated_at: Option<String>,
    selected_version_id: Option<String>,
    autosave_mode: AutosaveMode,
}

/// Fields of the meta file a write may override.
#[derive(Debug, Clone, Default)]
pub struct MetaPatch {
    pub selected_version_id: Option<Option<String>>,
    pub autosave_mode: Option<AutosaveMode>,
}

impl Store {
    /// Current draft + meta, with defaults when nothing was saved yet or a
    /// file on disk is unreadable.
    pub async fn workspace(&self, uid: &str) -> Result<WorkspaceState, StoreError> {
        let dir = self.user_dir(uid).await?;

        let data = match tokio::fs::read(dir.join("current.json")).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(uid, "unreadable current.json, serving empty draft: {e}");
                empty_draft()
            }),
            Err(_) => empty_draft(),
        };

        let meta = read_meta(&dir).await;
        Ok(WorkspaceState {
            rev: meta.rev,
            updated_at: meta.updated_at,
            data,
            selected_version_id: meta.selected_version_id,
            autosave_mode: meta.autosave_mode,
        })
    }

    /// Saves the draft, bumping `rev`. `expected_rev` enables optimistic
    /// concurrency: on mismatch nothing is written.
    pub async fn save_workspace(
        &self,
        uid: &str,
        data: &Value,
        expected_rev: Option<u64>,
        patch: MetaPatch,
    ) -> Result<WorkspaceState, StoreError> {
        let dir = self.user_dir(uid).await?;
        let current = read_meta(&dir).await;

        if let Some(expected) = expected_rev {
            if expected != current.rev {
                return Err(StoreError::RevConflict {
                    server_rev: current.rev,
                });
            }
        }

        let data = normalize(data)?;
        let meta = WorkspaceMeta {
            rev: current.rev + 1,
            updated_at: Some(Utc::now().to_rfc3339()),
            selected_version_id: patch
                .selected_version_id
                .unwrap_or(current.selected_version_id),
            autosave_mode: patch.autosave_mode.unwrap_or(current.autosave_mode),
        };

        tokio::fs::write(dir.join("current.json"), serde_json::to_vec_pretty(&data)?).await?;
        tokio::fs::write(
            dir.join("current.meta.json"),
            serde_json::to_vec(&meta)?,
        )
        .await?;

        Ok(WorkspaceState {
            rev: meta.rev,
            updated_at: meta.updated_at,
            data,
            selected_version_id: meta.selected_version_id,
            autosave_mode: meta.autosave_mode,
        })
    }

    /// Loads a version into the workspace and marks it selected. Passing no
    /// id clears the selection while keeping the draft.
    pub async fn select_version(
        &self,
        uid: &str,
        version_id: Option<&str>,
    ) -> Result<WorkspaceState, StoreError> {
        match version_id {
            Some(vid) => {
                let data = self.load_version(uid, vid).await?;
                self.save_workspace(
                    uid,
                    &data,
                    None,
                    MetaPatch {
                        selected_version_id: Some(Some(vid.to_string())),
                        ..Default::default()
                    },
                )
                .await
            }
            None => {
                let current = self.workspace(uid).await?;
                self.save_workspace(
                    uid,
                    &current.data,
                    None,
                    MetaPatch {
                        selected_version_id: Some(None),
                        ..Default::default()
                    },
                )
                .await
            }
        }
    }

    pub async fn set_autosave_mode(
        &self,
        uid: &str,
        mode: AutosaveMode,
    ) -> Result<WorkspaceState, StoreError> {
        let current = self.workspace(uid).await?;
        self.save_workspace(
            uid,
            &current.data,
            None,
            MetaPatch {
                autosave_mode: Some(mode),
                ..Default::default()
            },
        )
        .await
    }
}

async fn read_meta(dir: &std::path::Path) -> WorkspaceMeta {
    match tokio::fs::read(dir.join("current.meta.json")).await {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
        Err(_) => WorkspaceMeta::default(),
    }
}

fn empty_draft() -> Value {
    serde_json::to_value(crate::models::resume::ResumeRecord::default())
        .unwrap_or(Value::Object(Default::default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> (tempfile::TempDir, Store) {
        let tmp = tempfile::tempdir().unwrap();
        let store = Store::new(tmp.path());
        (tmp, store)
    }

    #[tokio::test]
    async fn test_fresh_workspace_defaults() {
        let (_tmp, store) = store();
        let ws = store.workspace("demo").await.unwrap();
        assert_eq!(ws.rev, 0);
        assert_eq!(ws.autosave_mode, AutosaveMode::Workspace);
        assert!(ws.selected_version_id.is_none());
        assert_eq!(ws.data["first_name"], "");
    }

    #[tokio::test]
    async fn test_save_bumps_rev_monotonically() {
        let (_tmp, store) = store();
        let a = store
            .save_workspace("demo", &json!({"first_name": "Ada"}), None, MetaPatch::default())
            .await
            .unwrap();
        let b = store
            .save_workspace("demo", &json!({"first_name": "Ada"}), None, MetaPatch::default())
            .await
            .unwrap();
        assert_eq!(a.rev, 1);
        assert_eq!(b.rev, 2);
        assert!(b.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_rev_conflict_leaves_state_unchanged() {
        let (_tmp, store) = store();
        store
            .save_workspace("demo", &json!({"first_name": "Ada"}), None, MetaPatch::default())
            .await
            .unwrap();

        let err = store
            .save_workspace("demo", &json!({"first_name": "Eve"}), Some(0), MetaPatch::default())
            .await
            .unwrap_err();
        match err {
            StoreError::RevConflict { server_rev } => assert_eq!(server_rev, 1),
            other => panic!("expected rev conflict, got {other:?}"),
        }

        let ws = store.workspace("demo").await.unwrap();
        assert_eq!(ws.rev, 1);
        assert_eq!(ws.data["first_name"], "Ada");
    }

    #[tokio::test]
    async fn test_saved_draft_is_normalized() {
        let (_tmp, store) = store();
        let ws = store
            .save_workspace(
                "demo",
                &json!({"first_name": " Ada ", "skills": ["Rust", "none"]}),
                None,
                MetaPatch::default(),
            )
            .await
            .unwrap();
        assert_eq!(ws.data["first_name"], "Ada");
        assert_eq!(ws.data["skills"], json!(["Rust"]));
    }

    #[tokio::test]
    async fn test_select_and_mode_round_trip() {
        let (_tmp, store) = store();
        let meta = store
            .save_version("demo", &json!({"first_name": "Ada"}), Some("v1".into()))
            .await
            .unwrap();

        let ws = store.select_version("demo", Some(&meta.id)).await.unwrap();
        assert_eq!(ws.selected_version_id.as_deref(), Some(meta.id.as_str()));
        assert_eq!(ws.data["first_name"], "Ada");

        let ws = store
            .set_autosave_mode("demo", AutosaveMode::SnapshotOnSave)
            .await
            .unwrap();
        assert_eq!(ws.autosave_mode, AutosaveMode::SnapshotOnSave);
        // Selection survives the mode change.
        assert_eq!(ws.selected_version_id.as_deref(), Some(meta.id.as_str()));

        let ws = store.select_version("demo", None).await.unwrap();
        assert!(ws.selected_version_id.is_none());
    }
}
