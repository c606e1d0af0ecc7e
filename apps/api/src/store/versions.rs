//! Immutable version snapshots: `<version-id>.json` files plus an
//! `index.json` kept newest first.

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use super::{normalize, Store, StoreError, VersionMeta};

impl Store {
    pub async fn list_versions(&self, uid: &str) -> Result<Vec<VersionMeta>, StoreError> {
        let dir = self.user_dir(uid).await?;
        Ok(read_index(&dir).await)
    }

    /// Loads and re-normalizes a snapshot, so stale files written by older
    /// builds still come back in the canonical shape.
    pub async fn load_version(&self, uid: &str, vid: &str) -> Result<Value, StoreError> {
        let dir = self.user_dir(uid).await?;
        let path = dir.join(format!("{}.json", checked_id(vid)?));
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|_| StoreError::VersionNotFound)?;
        normalize(&serde_json::from_slice(&bytes)?)
    }

    pub async fn save_version(
        &self,
        uid: &str,
        data: &Value,
        name: Option<String>,
    ) -> Result<VersionMeta, StoreError> {
        let dir = self.user_dir(uid).await?;
        let data = normalize(data)?;

        let created_at = Utc::now().to_rfc3339();
        let meta = VersionMeta {
            id: Uuid::new_v4().to_string(),
            name: name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| format!("Resume {}", &created_at[..10])),
            created_at,
        };

        tokio::fs::write(
            dir.join(format!("{}.json", meta.id)),
            serde_json::to_vec_pretty(&data)?,
        )
        .await?;

        let mut index = read_index(&dir).await;
        index.insert(0, meta.clone());
        write_index(&dir, &index).await?;
        Ok(meta)
    }

    pub async fn overwrite_version(
        &self,
        uid: &str,
        vid: &str,
        data: &Value,
    ) -> Result<(), StoreError> {
        let dir = self.user_dir(uid).await?;
        let path = dir.join(format!("{}.json", checked_id(vid)?));
        if tokio::fs::metadata(&path).await.is_err() {
            return Err(StoreError::VersionNotFound);
        }
        let data = normalize(data)?;
        tokio::fs::write(&path, serde_json::to_vec_pretty(&data)?).await?;
        Ok(())
    }

    /// Idempotent: deleting an unknown id is not an error.
    pub async fn delete_version(&self, uid: &str, vid: &str) -> Result<(), StoreError> {
        let dir = self.user_dir(uid).await?;
        let vid = checked_id(vid)?;

        let index: Vec<VersionMeta> = read_index(&dir)
            .await
            .into_iter()
            .filter(|m| m.id != vid)
            .collect();
        write_index(&dir, &index).await?;

        let _ = tokio::fs::remove_file(dir.join(format!("{vid}.json"))).await;
        Ok(())
    }
}

/// Version ids are always server-generated UUIDs; anything else in a path
/// segment is rejected before it can name a file.
fn checked_id(vid: &str) -> Result<&str, StoreError> {
    Uuid::parse_str(vid)
        .map(|_| vid)
        .map_err(|_| StoreError::InvalidVersionId)
}

async fn read_index(dir: &std::path::Path) -> Vec<VersionMeta> {
    match tokio::fs::read(dir.join("index.json")).await {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
        Err(_) => Vec::new(),
    }
}

async fn write_index(dir: &std::path::Path, index: &[VersionMeta]) -> Result<(), StoreError> {
    tokio::fs::write(dir.join("index.json"), serde_json::to_vec_pretty(index)?).await?;
    Ok(())
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
    async fn test_save_list_load_round_trip() {
        let (_tmp, store) = store();
        let a = store
            .save_version("demo", &json!({"first_name": "Ada"}), Some("first".into()))
            .await
            .unwrap();
        let b = store
            .save_version("demo", &json!({"first_name": "Eve"}), None)
            .await
            .unwrap();

        let list = store.list_versions("demo").await.unwrap();
        // Newest first.
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, b.id);
        assert_eq!(list[1].id, a.id);
        assert!(list[0].name.starts_with("Resume "));

        let data = store.load_version("demo", &a.id).await.unwrap();
        assert_eq!(data["first_name"], "Ada");
    }

    #[tokio::test]
    async fn test_load_unknown_version() {
        let (_tmp, store) = store();
        let err = store
            .load_version("demo", &Uuid::new_v4().to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::VersionNotFound));
    }

    #[tokio::test]
    async fn test_non_uuid_id_rejected() {
        let (_tmp, store) = store();
        let err = store.load_version("demo", "../current").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidVersionId));
    }

    #[tokio::test]
    async fn test_overwrite_and_delete() {
        let (_tmp, store) = store();
        let meta = store
            .save_version("demo", &json!({"first_name": "Ada"}), None)
            .await
            .unwrap();

        store
            .overwrite_version("demo", &meta.id, &json!({"first_name": "Eve"}))
            .await
            .unwrap();
        let data = store.load_version("demo", &meta.id).await.unwrap();
        assert_eq!(data["first_name"], "Eve");

        store.delete_version("demo", &meta.id).await.unwrap();
        assert!(store.list_versions("demo").await.unwrap().is_empty());
        assert!(store.load_version("demo", &meta.id).await.is_err());

        // Second delete is a no-op.
        store.delete_version("demo", &meta.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let (_tmp, store) = store();
        store
            .save_version("alice", &json!({"first_name": "Alice"}), None)
            .await
            .unwrap();
        assert!(store.list_versions("bob").await.unwrap().is_empty());
    }
}
