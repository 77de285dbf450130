use serde::{Deserialize, Serialize};

use super::analysis::AnalysisRecord;
use crate::pipeline::storage::StorageError;

/// Terminal processing status of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    Processed,
    Failed,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processed => "PROCESSED",
            Self::Failed => "FAILED",
        }
    }
}

impl std::str::FromStr for ItemStatus {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROCESSED" => Ok(Self::Processed),
            "FAILED" => Ok(Self::Failed),
            _ => Err(StorageError::InvalidEnum {
                field: "ItemStatus".into(),
                value: s.into(),
            }),
        }
    }
}

/// Per-item status, one per `item_id`. Later writes replace earlier ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
    pub item_id: String,
    pub status: ItemStatus,
    pub original_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub last_processed_timestamp: i64,
}

impl StatusRecord {
    pub fn processed(item_id: &str, original_key: &str, processed_key: &str, timestamp: i64) -> Self {
        Self {
            item_id: item_id.to_string(),
            status: ItemStatus::Processed,
            original_key: original_key.to_string(),
            processed_key: Some(processed_key.to_string()),
            error_message: None,
            last_processed_timestamp: timestamp,
        }
    }

    pub fn failed(item_id: &str, original_key: &str, message: &str, timestamp: i64) -> Self {
        Self {
            item_id: item_id.to_string(),
            status: ItemStatus::Failed,
            original_key: original_key.to_string(),
            processed_key: None,
            error_message: Some(message.to_string()),
            last_processed_timestamp: timestamp,
        }
    }
}

/// A full metadata row: status plus the analysis for processed items.
///
/// `analysis` is `None` for failed items; a failed write never carries
/// analysis fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataRow {
    #[serde(flatten)]
    pub status: StatusRecord,
    #[serde(flatten)]
    pub analysis: Option<AnalysisRecord>,
}

impl MetadataRow {
    pub fn processed(status: StatusRecord, analysis: AnalysisRecord) -> Self {
        Self {
            status,
            analysis: Some(analysis),
        }
    }

    pub fn failed(status: StatusRecord) -> Self {
        Self {
            status,
            analysis: None,
        }
    }

    pub fn item_id(&self) -> &str {
        &self.status.item_id
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
