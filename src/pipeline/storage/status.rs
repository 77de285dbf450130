use super::metadata_store::MetadataStore;
use super::StorageError;
use crate::models::{now_millis, MetadataRow, StatusRecord};

/// Records terminal failures, replacing any earlier row for the item.
pub struct StatusTracker<'a> {
    metadata: &'a dyn MetadataStore,
}

impl<'a> StatusTracker<'a> {
    pub fn new(metadata: &'a dyn MetadataStore) -> Self {
        Self { metadata }
    }

    /// Write a minimal `FAILED` row. An error here is not recovered by callers.
    pub fn record_failure(
        &self,
        item_id: &str,
        source_key: &str,
        message: &str,
    ) -> Result<(), StorageError> {
        let row = MetadataRow::failed(StatusRecord::failed(
            item_id,
            source_key,
            message,
            now_millis(),
        ));
        self.metadata.upsert(&row)?;

        tracing::info!(item_id, source_key, "Failure status recorded");
        Ok(())
    }
}
