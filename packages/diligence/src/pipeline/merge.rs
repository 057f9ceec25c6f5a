//! Downstream merge of company and executive records.
//!
//! Reads the newest [`TaskKind::CompanyFilings`] and [`TaskKind::Executives`]
//! versions for each requested entity and publishes one combined document
//! to the blob store under the timestamped and `_latest` keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::StoreResult;
use crate::traits::store::{publish_with_latest, BlobStore, RecordStore, StoredRecord};
use crate::types::query::TaskKind;

/// File stem of the merged document.
pub const MERGED_STEM: &str = "merged_company_data";

/// File stem of the merge summary report.
pub const SUMMARY_STEM: &str = "merge_summary";

/// Which sources an entity's merged entry draws on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataCompleteness {
    pub has_company_data: bool,
    pub has_executive_data: bool,
    pub executive_count: usize,
}

/// One entity's merged entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedEntity {
    pub entity_id: String,
    pub entity_name: Option<String>,
    /// Company record plus its extraction timestamp.
    pub company_data: Option<serde_json::Value>,
    pub executives: Vec<serde_json::Value>,
    pub data_completeness: DataCompleteness,
}

/// Counts over a whole merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSummary {
    pub total_entities: usize,
    pub entities_with_company_data: usize,
    pub entities_with_executive_data: usize,
    pub total_executives: usize,
    pub entity_ids: Vec<String>,
}

/// The published merge document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedDocument {
    pub generated_at: DateTime<Utc>,
    pub entities: Vec<MergedEntity>,
    pub summary: MergeSummary,
}

/// Published keys of a merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutput {
    /// Timestamped key of the merged document.
    pub document_key: String,
    /// Timestamped key of the summary report.
    pub summary_key: String,
}

fn company_data(record: StoredRecord) -> serde_json::Value {
    let mut data = record.record;
    if let Some(object) = data.as_object_mut() {
        object.insert(
            "extraction_timestamp".to_string(),
            serde_json::Value::String(record.extracted_at.to_rfc3339()),
        );
    }
    data
}

fn executives_of(record: &StoredRecord) -> Vec<serde_json::Value> {
    record
        .record
        .get("executives")
        .and_then(|e| e.as_array())
        .cloned()
        .unwrap_or_default()
}

/// Build the merged entry for one entity.
pub async fn merge_entity(records: &dyn RecordStore, entity_id: &str) -> StoreResult<MergedEntity> {
    let company = records
        .query_latest(entity_id, TaskKind::CompanyFilings)
        .await?;
    let roster = records.query_latest(entity_id, TaskKind::Executives).await?;

    let executives = roster.as_ref().map(executives_of).unwrap_or_default();
    let entity_name = company
        .as_ref()
        .or(roster.as_ref())
        .map(|r| r.entity_name.clone());

    let data_completeness = DataCompleteness {
        has_company_data: company.is_some(),
        has_executive_data: !executives.is_empty(),
        executive_count: executives.len(),
    };

    Ok(MergedEntity {
        entity_id: entity_id.to_string(),
        entity_name,
        company_data: company.map(company_data),
        executives,
        data_completeness,
    })
}

/// Merge the given entities into one document.
///
/// Entity ids are deduplicated and sorted. Entities with no stored record
/// still get an entry whose completeness block reports the gap.
pub async fn build_document(
    records: &dyn RecordStore,
    entity_ids: &[String],
    at: DateTime<Utc>,
) -> StoreResult<MergedDocument> {
    let mut ids: Vec<String> = entity_ids.to_vec();
    ids.sort();
    ids.dedup();

    let mut entities = Vec::with_capacity(ids.len());
    for id in &ids {
        entities.push(merge_entity(records, id).await?);
    }

    let summary = MergeSummary {
        total_entities: entities.len(),
        entities_with_company_data: entities
            .iter()
            .filter(|e| e.data_completeness.has_company_data)
            .count(),
        entities_with_executive_data: entities
            .iter()
            .filter(|e| e.data_completeness.has_executive_data)
            .count(),
        total_executives: entities
            .iter()
            .map(|e| e.data_completeness.executive_count)
            .sum(),
        entity_ids: ids,
    };

    Ok(MergedDocument {
        generated_at: at,
        entities,
        summary,
    })
}

/// Merge and publish. Returns the timestamped key of the merged document.
#[instrument(skip(records, blobs, entity_ids), fields(entities = entity_ids.len(), prefix = %prefix))]
pub async fn merge_entities(
    records: &dyn RecordStore,
    blobs: &dyn BlobStore,
    entity_ids: &[String],
    prefix: &str,
    at: DateTime<Utc>,
) -> StoreResult<MergeOutput> {
    let document = build_document(records, entity_ids, at).await?;
    tracing::info!(
        total = document.summary.total_entities,
        with_company = document.summary.entities_with_company_data,
        with_executives = document.summary.entities_with_executive_data,
        executives = document.summary.total_executives,
        "Merged entity records"
    );

    let document_key =
        publish_with_latest(blobs, prefix, MERGED_STEM, at, &serde_json::to_value(&document)?)
            .await?;
    let summary_key = publish_with_latest(
        blobs,
        prefix,
        SUMMARY_STEM,
        at,
        &serde_json::to_value(&document.summary)?,
    )
    .await?;

    Ok(MergeOutput {
        document_key,
        summary_key,
    })
}
