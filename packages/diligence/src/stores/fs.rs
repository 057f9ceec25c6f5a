//! Filesystem storage.
//!
//! Layout under the root directory:
//!
//! ```text
//! records/<entity_id>/<task>/<YYYYMMDDTHHMMSS.ffffffZ>.json
//! blobs/<key>
//! ```
//!
//! Every file is written to a temporary sibling and renamed into place, so
//! a crash mid-write never leaves a truncated version behind.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::error::{StoreError, StoreResult};
use crate::traits::store::{BlobStore, RecordStore, StoredRecord};
use crate::types::query::TaskKind;

/// Lexically sortable version file name.
const VERSION_FORMAT: &str = "%Y%m%dT%H%M%S%.6fZ";

pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn task_dir(&self, entity_id: &str, task: TaskKind) -> StoreResult<PathBuf> {
        let entity = safe_segment(entity_id)?;
        Ok(self.root.join("records").join(entity).join(task.as_str()))
    }

    fn blob_path(&self, key: &str) -> StoreResult<PathBuf> {
        let relative = Path::new(key);
        let clean = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if key.is_empty() || !clean {
            return Err(invalid_key(key));
        }
        Ok(self.root.join("blobs").join(relative))
    }
}

fn invalid_key(key: &str) -> StoreError {
    StoreError::Backend(format!("invalid storage key: {:?}", key).into())
}

fn safe_segment(segment: &str) -> StoreResult<&str> {
    if segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\'])
    {
        return Err(invalid_key(segment));
    }
    Ok(segment)
}

async fn write_atomic(path: &Path, bytes: Vec<u8>) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, bytes).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> StoreResult<Option<T>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Version files in a task directory, oldest first.
async fn version_files(dir: &Path) -> StoreResult<Vec<PathBuf>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[async_trait]
impl RecordStore for FsStore {
    async fn upsert(&self, record: &StoredRecord) -> StoreResult<()> {
        let file = format!("{}.json", record.extracted_at.format(VERSION_FORMAT));
        let path = self.task_dir(&record.entity_id, record.task)?.join(file);
        write_atomic(&path, serde_json::to_vec_pretty(record)?).await?;

        tracing::debug!(path = %path.display(), "Record version written");
        Ok(())
    }

    async fn query_latest(
        &self,
        entity_id: &str,
        task: TaskKind,
    ) -> StoreResult<Option<StoredRecord>> {
        let files = version_files(&self.task_dir(entity_id, task)?).await?;
        match files.last() {
            Some(path) => read_json(path).await,
            None => Ok(None),
        }
    }

    async fn versions(&self, entity_id: &str, task: TaskKind) -> StoreResult<Vec<StoredRecord>> {
        let mut out = Vec::new();
        for path in version_files(&self.task_dir(entity_id, task)?).await? {
            if let Some(record) = read_json(&path).await? {
                out.push(record);
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl BlobStore for FsStore {
    async fn put_object(&self, key: &str, body: &serde_json::Value) -> StoreResult<()> {
        write_atomic(&self.blob_path(key)?, serde_json::to_vec_pretty(body)?).await
    }

    async fn get_object(&self, key: &str) -> StoreResult<Option<serde_json::Value>> {
        read_json(&self.blob_path(key)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExtractionMethod;
    use crate::types::completeness::CompletenessScore;
    use chrono::{TimeZone, Utc};

    fn record(second: u32, filled: u32) -> StoredRecord {
        StoredRecord {
            entity_id: "acme_corp".to_string(),
            entity_name: "Acme Corp".to_string(),
            task: TaskKind::CompanyFilings,
            extracted_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, second).unwrap(),
            completeness: CompletenessScore::new(filled, 12),
            satisfied: false,
            method: ExtractionMethod::PatternFallback,
            attempts: 3,
            sources: vec!["https://www.sec.gov/x".to_string()],
            record: serde_json::json!({"registered_legal_name": "Acme Corp"}),
        }
    }

    #[tokio::test]
    async fn test_round_trips_versions_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());

        store.upsert(&record(5, 9)).await.unwrap();
        store.upsert(&record(1, 4)).await.unwrap();

        let versions = store
            .versions("acme_corp", TaskKind::CompanyFilings)
            .await
            .unwrap();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].completeness.filled, 4);

        let latest = store
            .query_latest("acme_corp", TaskKind::CompanyFilings)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest, record(5, 9));
    }

    #[tokio::test]
    async fn test_missing_entity_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());

        assert!(store
            .query_latest("nobody", TaskKind::Sanctions)
            .await
            .unwrap()
            .is_none());
        assert!(store.get_object("merged/none.json").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_blob_keys_cannot_escape_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let body = serde_json::json!({});

        assert!(store.put_object("../escape.json", &body).await.is_err());
        assert!(store.put_object("/abs.json", &body).await.is_err());
        store.put_object("merged/acme.json", &body).await.unwrap();
        assert!(dir.path().join("blobs/merged/acme.json").exists());
    }
}
