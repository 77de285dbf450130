use super::metadata_store::MetadataStore;
use super::object_store::ObjectStore;
use super::StorageError;
use crate::models::{now_millis, AnalysisRecord, MetadataRow, StatusRecord};

/// Key prefix for companion text objects in the processed container.
pub const PROCESSED_TEXT_PREFIX: &str = "processed_texts";

/// Deterministic companion-object key for an item.
pub fn processed_key_for(item_id: &str) -> String {
    format!("{PROCESSED_TEXT_PREFIX}/{item_id}.txt")
}

/// Writes a successful analysis and its companion text.
///
/// The companion text is written first and the `PROCESSED` row last, so a
/// failure in between never leaves a processed row pointing at a missing
/// object.
pub struct PersistenceGateway<'a> {
    objects: &'a dyn ObjectStore,
    metadata: &'a dyn MetadataStore,
    processed_container: &'a str,
}

impl<'a> PersistenceGateway<'a> {
    pub fn new(
        objects: &'a dyn ObjectStore,
        metadata: &'a dyn MetadataStore,
        processed_container: &'a str,
    ) -> Self {
        Self {
            objects,
            metadata,
            processed_container,
        }
    }

    /// Persist `record` and `text` for `item_id`. Returns the processed key.
    pub fn persist(
        &self,
        item_id: &str,
        record: &AnalysisRecord,
        source_key: &str,
        text: &str,
    ) -> Result<String, StorageError> {
        let processed_key = processed_key_for(item_id);

        self.objects
            .put(self.processed_container, &processed_key, text.as_bytes())?;

        let row = MetadataRow::processed(
            StatusRecord::processed(item_id, source_key, &processed_key, now_millis()),
            record.clone(),
        );
        self.metadata.upsert(&row)?;

        tracing::info!(
            item_id,
            processed_key = processed_key.as_str(),
            text_length = text.len(),
            "Analysis persisted"
        );

        Ok(processed_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemStatus;
    use crate::pipeline::storage::{MemoryObjectStore, SqliteMetadataStore};

    /// Object store whose writes always fail.
    struct ReadOnlyStore;

    impl ObjectStore for ReadOnlyStore {
        fn get(&self, container: &str, key: &str) -> Result<Vec<u8>, StorageError> {
            Err(StorageError::NotFound {
                container: container.into(),
                key: key.into(),
            })
        }

        fn put(&self, _: &str, _: &str, _: &[u8]) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        }
    }

    #[test]
    fn processed_key_is_deterministic() {
        assert_eq!(processed_key_for("book1"), "processed_texts/book1.txt");
        assert_eq!(processed_key_for("book1"), processed_key_for("book1"));
    }

    #[test]
    fn persist_writes_text_and_processed_row() {
        let objects = MemoryObjectStore::new();
        let metadata = SqliteMetadataStore::open_in_memory().unwrap();
        let gateway = PersistenceGateway::new(&objects, &metadata, "processed");

        let record = AnalysisRecord {
            title: "Persuasion".into(),
            ..Default::default()
        };
        let key = gateway
            .persist("persuasion", &record, "uploads/persuasion.txt", "Sir Walter Elliot")
            .unwrap();

        assert_eq!(key, "processed_texts/persuasion.txt");
        assert_eq!(objects.get("processed", &key).unwrap(), b"Sir Walter Elliot");

        let row = metadata.get("persuasion").unwrap().unwrap();
        assert_eq!(row.status.status, ItemStatus::Processed);
        assert_eq!(row.status.original_key, "uploads/persuasion.txt");
        assert_eq!(row.status.processed_key.as_deref(), Some(key.as_str()));
        assert!(row.status.error_message.is_none());
        assert_eq!(row.analysis.unwrap().title, "Persuasion");
    }

    #[test]
    fn text_write_failure_leaves_no_processed_row() {
        let objects = ReadOnlyStore;
        let metadata = SqliteMetadataStore::open_in_memory().unwrap();
        let gateway = PersistenceGateway::new(&objects, &metadata, "processed");

        let result = gateway.persist("emma", &AnalysisRecord::default(), "emma.txt", "text");

        assert!(result.is_err());
        assert!(metadata.get("emma").unwrap().is_none());
    }
}
