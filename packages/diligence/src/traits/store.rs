//! Persistence collaborators.
//!
//! Two stores with different shapes:
//!
//! - [`RecordStore`] - versioned records keyed by entity and timestamp.
//!   Writes never replace an earlier version, so a failed write cannot
//!   damage what is already stored.
//! - [`BlobStore`] - whole JSON documents by key, used by the merge step.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::extract::ExtractionMethod;
use crate::types::completeness::CompletenessScore;
use crate::types::query::TaskKind;

/// A persisted extraction result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Partition key, see [`crate::types::entity::normalize_entity_id`].
    pub entity_id: String,
    pub entity_name: String,
    pub task: TaskKind,
    /// Sort key.
    pub extracted_at: DateTime<Utc>,
    pub completeness: CompletenessScore,
    /// Whether the completeness target was reached.
    pub satisfied: bool,
    pub method: ExtractionMethod,
    /// Full attempts the run made.
    pub attempts: u32,
    /// Evidence URLs behind the record.
    pub sources: Vec<String>,
    pub record: serde_json::Value,
}

/// Versioned record storage.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a version under `(entity_id, task, extracted_at)`.
    ///
    /// Writing the same key twice replaces that one version; other
    /// versions are never touched.
    async fn upsert(&self, record: &StoredRecord) -> StoreResult<()>;

    /// Newest version for an entity and task.
    async fn query_latest(
        &self,
        entity_id: &str,
        task: TaskKind,
    ) -> StoreResult<Option<StoredRecord>>;

    /// Every version for an entity and task, oldest first.
    async fn versions(&self, entity_id: &str, task: TaskKind) -> StoreResult<Vec<StoredRecord>>;
}

/// Key-addressed JSON document storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put_object(&self, key: &str, body: &serde_json::Value) -> StoreResult<()>;

    async fn get_object(&self, key: &str) -> StoreResult<Option<serde_json::Value>>;
}

/// Write `value` under a timestamped key and then under the fixed
/// `{prefix}/{stem}_latest.json` key. Returns the timestamped key.
pub async fn publish_with_latest(
    store: &dyn BlobStore,
    prefix: &str,
    stem: &str,
    at: DateTime<Utc>,
    value: &serde_json::Value,
) -> StoreResult<String> {
    let prefix = prefix.trim_end_matches('/');
    let stamped = format!("{}/{}_{}.json", prefix, stem, at.format("%Y%m%d_%H%M%S"));
    let latest = format!("{}/{}_latest.json", prefix, stem);

    store.put_object(&stamped, value).await?;
    store.put_object(&latest, value).await?;

    tracing::info!(key = %stamped, latest = %latest, "Published document");
    Ok(stamped)
}
