//! In-memory storage implementation for testing and development.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use crate::error::StoreResult;
use crate::traits::store::{BlobStore, RecordStore, StoredRecord};
use crate::types::query::TaskKind;

type VersionKey = (String, TaskKind);

/// In-memory record and blob storage.
///
/// Useful for testing and development. Not suitable for production
/// as data is lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<VersionKey, BTreeMap<DateTime<Utc>, StoredRecord>>>,
    blobs: RwLock<BTreeMap<String, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total stored record versions across all entities.
    pub fn record_count(&self) -> usize {
        self.records.read().unwrap().values().map(BTreeMap::len).sum()
    }

    /// Blob keys in lexical order.
    pub fn blob_keys(&self) -> Vec<String> {
        self.blobs.read().unwrap().keys().cloned().collect()
    }

    /// Every stored record, newest version per entity and task.
    pub fn latest_records(&self) -> Vec<StoredRecord> {
        self.records
            .read()
            .unwrap()
            .values()
            .filter_map(|versions| versions.values().next_back().cloned())
            .collect()
    }

    pub fn clear(&self) {
        self.records.write().unwrap().clear();
        self.blobs.write().unwrap().clear();
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn upsert(&self, record: &StoredRecord) -> StoreResult<()> {
        self.records
            .write()
            .unwrap()
            .entry((record.entity_id.clone(), record.task))
            .or_default()
            .insert(record.extracted_at, record.clone());
        Ok(())
    }

    async fn query_latest(
        &self,
        entity_id: &str,
        task: TaskKind,
    ) -> StoreResult<Option<StoredRecord>> {
        Ok(self
            .records
            .read()
            .unwrap()
            .get(&(entity_id.to_string(), task))
            .and_then(|versions| versions.values().next_back().cloned()))
    }

    async fn versions(&self, entity_id: &str, task: TaskKind) -> StoreResult<Vec<StoredRecord>> {
        Ok(self
            .records
            .read()
            .unwrap()
            .get(&(entity_id.to_string(), task))
            .map(|versions| versions.values().cloned().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn put_object(&self, key: &str, body: &serde_json::Value) -> StoreResult<()> {
        self.blobs
            .write()
            .unwrap()
            .insert(key.to_string(), body.clone());
        Ok(())
    }

    async fn get_object(&self, key: &str) -> StoreResult<Option<serde_json::Value>> {
        Ok(self.blobs.read().unwrap().get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExtractionMethod;
    use crate::traits::store::publish_with_latest;
    use crate::types::completeness::CompletenessScore;
    use chrono::TimeZone;

    fn record(entity_id: &str, second: u32, filled: u32) -> StoredRecord {
        StoredRecord {
            entity_id: entity_id.to_string(),
            entity_name: "Acme".to_string(),
            task: TaskKind::Executives,
            extracted_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, second).unwrap(),
            completeness: CompletenessScore::new(filled, 10),
            satisfied: false,
            method: ExtractionMethod::Llm,
            attempts: 1,
            sources: vec![],
            record: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn test_versions_are_kept_and_latest_wins() {
        let store = MemoryStore::new();
        store.upsert(&record("acme", 2, 8)).await.unwrap();
        store.upsert(&record("acme", 1, 5)).await.unwrap();
        store.upsert(&record("globex", 1, 3)).await.unwrap();

        let latest = store
            .query_latest("acme", TaskKind::Executives)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.completeness.filled, 8);

        let versions = store.versions("acme", TaskKind::Executives).await.unwrap();
        assert_eq!(versions.len(), 2);
        assert!(versions[0].extracted_at < versions[1].extracted_at);
        assert_eq!(store.record_count(), 3);
        assert!(store
            .query_latest("acme", TaskKind::Sanctions)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_same_key_replaces_single_version() {
        let store = MemoryStore::new();
        store.upsert(&record("acme", 1, 5)).await.unwrap();
        store.upsert(&record("acme", 1, 6)).await.unwrap();

        let versions = store.versions("acme", TaskKind::Executives).await.unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].completeness.filled, 6);
    }

    #[tokio::test]
    async fn test_publish_with_latest_writes_both_keys() {
        let store = MemoryStore::new();
        let at = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();

        let key = publish_with_latest(&store, "merged/", "acme", at, &serde_json::json!({"a": 1}))
            .await
            .unwrap();

        assert_eq!(key, "merged/acme_20250304_050607.json");
        assert_eq!(
            store.blob_keys(),
            vec!["merged/acme_20250304_050607.json", "merged/acme_latest.json"]
        );
        assert_eq!(
            store.get_object("merged/acme_latest.json").await.unwrap().unwrap()["a"],
            1
        );
    }
}
