//! BatchDispatcher: carries each item through the pipeline.
//!
//! Extraction → Analysis → Persistence, one item at a time in input order.
//! A failing item gets a `FAILED` row and the loop moves on.

use uuid::Uuid;

use super::error::{DispatchError, ProcessingError};
use super::types::*;
use crate::context::PipelineContext;
use crate::models::BookItem;
use crate::pipeline::analysis::BookAnalyzer;
use crate::pipeline::extraction::TextExtractor;
use crate::pipeline::storage::{PersistenceGateway, StatusTracker};

/// A processing error tagged with the stage it happened in.
struct StageFailure {
    stage: ItemStage,
    error: ProcessingError,
}

fn at<E: Into<ProcessingError>>(stage: ItemStage) -> impl FnOnce(E) -> StageFailure {
    move |e| StageFailure {
        stage,
        error: e.into(),
    }
}

pub struct BatchDispatcher<'a> {
    ctx: &'a PipelineContext,
    extractor: TextExtractor,
}

impl<'a> BatchDispatcher<'a> {
    pub fn new(ctx: &'a PipelineContext) -> Self {
        Self::with_extractor(ctx, TextExtractor::default())
    }

    pub fn with_extractor(ctx: &'a PipelineContext, extractor: TextExtractor) -> Self {
        Self { ctx, extractor }
    }

    /// Process every item sequentially and reduce the outcomes.
    ///
    /// Only a failure to record a failure aborts the batch.
    pub fn process(&self, items: &[BookItem]) -> Result<BatchReport, DispatchError> {
        let invocation_id = Uuid::new_v4();
        let _span =
            tracing::info_span!("process_batch", %invocation_id, items = items.len()).entered();

        let mut reports = Vec::with_capacity(items.len());
        for item in items {
            reports.push(self.process_item(item)?);
        }

        let outcome_code = OutcomeCode::reduce(reports.iter().map(|r| &r.outcome));
        let report = BatchReport {
            invocation_id,
            outcome_code,
            message: summary_message(outcome_code, &reports),
            items: reports,
        };

        tracing::info!(
            outcome_code = outcome_code.code(),
            succeeded = report.succeeded_count(),
            failed = report.failed_count(),
            "Batch complete"
        );

        Ok(report)
    }

    fn process_item(&self, item: &BookItem) -> Result<ItemReport, DispatchError> {
        let _span = tracing::info_span!(
            "process_item",
            item_id = item.item_id.as_str(),
            source_key = item.source_key.as_str()
        )
        .entered();

        let outcome = match self.run_stages(item) {
            Ok(outcome) => outcome,
            Err(StageFailure { stage, error }) => {
                let class = error.class();
                let message = format!("{stage} failed: {error}");
                tracing::warn!(
                    stage = stage.as_str(),
                    class = ?class,
                    error = %error,
                    "Item failed"
                );

                StatusTracker::new(self.ctx.metadata.as_ref())
                    .record_failure(&item.item_id, &item.source_key, &message)
                    .map_err(|source| {
                        tracing::error!(error = %source, "Could not record failure status");
                        DispatchError::StatusWrite {
                            item_id: item.item_id.clone(),
                            source,
                        }
                    })?;

                ItemOutcome::Failed {
                    stage,
                    class,
                    message,
                }
            }
        };

        Ok(ItemReport {
            item_id: item.item_id.clone(),
            source_key: item.source_key.clone(),
            outcome,
        })
    }

    fn run_stages(&self, item: &BookItem) -> Result<ItemOutcome, StageFailure> {
        tracing::debug!(stage = ItemStage::Extracting.as_str(), "Stage started");
        let extracted = self
            .extractor
            .extract_item(self.ctx.objects.as_ref(), item)
            .map_err(at(ItemStage::Extracting))?;

        tracing::debug!(stage = ItemStage::Analyzing.as_str(), "Stage started");
        let analysis = BookAnalyzer::new(self.ctx.llm.as_ref())
            .analyze(&extracted.full_text, &item.item_id)
            .map_err(at(ItemStage::Analyzing))?;

        tracing::debug!(stage = ItemStage::Persisting.as_str(), "Stage started");
        let gateway = PersistenceGateway::new(
            self.ctx.objects.as_ref(),
            self.ctx.metadata.as_ref(),
            &self.ctx.config.processed_container,
        );
        let processed_key = gateway
            .persist(
                &item.item_id,
                analysis.record(),
                &item.source_key,
                &extracted.full_text,
            )
            .map_err(at(ItemStage::Persisting))?;

        tracing::info!(fallback = analysis.is_fallback(), "Item processed");

        Ok(ItemOutcome::Succeeded {
            processed_key,
            fallback: analysis.is_fallback(),
        })
    }
}

fn summary_message(outcome: OutcomeCode, reports: &[ItemReport]) -> String {
    let total = reports.len();
    let failed = reports
        .iter()
        .filter(|r| matches!(r.outcome, ItemOutcome::Failed { .. }))
        .count();

    match outcome {
        OutcomeCode::Succeeded => format!("Processed {total} item(s) successfully"),
        OutcomeCode::PartialFailure => {
            format!("{failed} of {total} item(s) failed with recoverable errors")
        }
        OutcomeCode::SevereFailure => {
            format!("{failed} of {total} item(s) failed; at least one failure was severe")
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::PipelineConfig;
    use crate::models::{ItemStatus, MetadataRow};
    use crate::pipeline::analysis::{AnalysisError, LlmClient, MockLlmClient, ModelRequest, ModelResponse};
    use crate::pipeline::storage::{
        MemoryObjectStore, MetadataStore, ObjectStore, SqliteMetadataStore, StorageError,
    };

    const SOURCE: &str = "uploads";

    const ANALYSIS_JSON: &str = r#"{
        "title": "The Lighthouse",
        "author": "A. Keeper",
        "genre": "Literary fiction",
        "protagonist": {"name": "Mara", "age": "40s", "visualSummary": "tall, grey coat, lantern"},
        "worldbuilding": "A remote island station.",
        "temporalSpatialSetting": "1920s, North Atlantic",
        "plotSummary": "A keeper waits out a storm.",
        "keyEvents": [
            {"episodeNum": 1, "eventSummary": "The supply boat is late"},
            {"episodeNum": 2, "eventSummary": "The storm arrives"},
            {"episodeNum": 3, "eventSummary": "The lamp fails"},
            {"episodeNum": 4, "eventSummary": "A ship is sighted"},
            {"episodeNum": 5, "eventSummary": "Dawn"}
        ],
        "endingSummary": "The ship passes safely.",
        "bookOverview": "A study of solitude and duty."
    }"#;

    fn context(objects: MemoryObjectStore, llm: Box<dyn LlmClient>) -> PipelineContext {
        PipelineContext::new(
            PipelineConfig::with_data_dir(PathBuf::from("/unused")),
            Box::new(objects),
            Box::new(SqliteMetadataStore::open_in_memory().unwrap()),
            llm,
        )
    }

    fn item(key: &str) -> BookItem {
        BookItem::from_object(SOURCE, key)
    }

    /// Fails with a 503 whenever the prompt contains `trigger`.
    struct FailingOn {
        trigger: &'static str,
    }

    impl LlmClient for FailingOn {
        fn generate(&self, request: &ModelRequest<'_>) -> Result<ModelResponse, AnalysisError> {
            if request.prompt.contains(self.trigger) {
                return Err(AnalysisError::ServiceStatus {
                    status: 503,
                    body: "unavailable".into(),
                });
            }
            MockLlmClient::new(ANALYSIS_JSON).generate(request)
        }
    }

    /// Metadata store that rejects every write.
    struct BrokenMetadata;

    impl MetadataStore for BrokenMetadata {
        fn upsert(&self, _row: &MetadataRow) -> Result<(), StorageError> {
            Err(StorageError::InvalidKey("read-only".into()))
        }
        fn get(&self, _item_id: &str) -> Result<Option<MetadataRow>, StorageError> {
            Ok(None)
        }
        fn count(&self) -> Result<usize, StorageError> {
            Ok(0)
        }
    }

    /// Object store that serves reads from `inner` and rejects every write.
    struct ReadOnlyObjects {
        inner: MemoryObjectStore,
    }

    impl ObjectStore for ReadOnlyObjects {
        fn get(&self, container: &str, key: &str) -> Result<Vec<u8>, StorageError> {
            self.inner.get(container, key)
        }
        fn put(&self, _container: &str, key: &str, _bytes: &[u8]) -> Result<(), StorageError> {
            Err(StorageError::InvalidKey(key.to_string()))
        }
    }

    #[test]
    fn success_and_unsupported_format_is_partial_failure() {
        let objects = MemoryObjectStore::new()
            .with_object(SOURCE, "book1.txt", b"Once upon a time on a lonely island.")
            .with_object(SOURCE, "book2.xyz", b"opaque");
        let ctx = context(objects, Box::new(MockLlmClient::new(ANALYSIS_JSON)));

        let report = BatchDispatcher::new(&ctx)
            .process(&[item("book1.txt"), item("book2.xyz")])
            .unwrap();

        assert_eq!(report.outcome_code.code(), 202);
        assert_eq!(report.items.len(), 2);

        let ok = ctx.metadata.get("book1").unwrap().unwrap();
        assert_eq!(ok.status.status, ItemStatus::Processed);
        assert_eq!(ok.status.processed_key.as_deref(), Some("processed_texts/book1.txt"));
        let analysis = ok.analysis.unwrap();
        assert_eq!(analysis.title, "The Lighthouse");
        assert_eq!(analysis.key_events.len(), 5);

        let failed = ctx.metadata.get("book2").unwrap().unwrap();
        assert_eq!(failed.status.status, ItemStatus::Failed);
        assert!(failed.analysis.is_none());
        let message = failed.status.error_message.unwrap();
        assert!(message.contains("xyz"), "message was: {message}");
        assert!(message.starts_with("extracting failed"));

        assert_eq!(ctx.metadata.count().unwrap(), 2);
    }

    #[test]
    fn companion_text_written_to_processed_container() {
        let text = "Chapter 1\nThe lamp was lit at dusk.";
        let objects = MemoryObjectStore::new().with_object(SOURCE, "book1.txt", text.as_bytes());
        let ctx = context(objects, Box::new(MockLlmClient::new(ANALYSIS_JSON)));

        BatchDispatcher::new(&ctx).process(&[item("book1.txt")]).unwrap();

        let stored = ctx
            .objects
            .get("processed-books", "processed_texts/book1.txt")
            .unwrap();
        assert_eq!(stored, text.as_bytes());
    }

    #[test]
    fn severe_failure_outranks_later_success() {
        let objects = MemoryObjectStore::new()
            .with_object(SOURCE, "a.txt", b"FAIL this one")
            .with_object(SOURCE, "b.txt", b"fine")
            .with_object(SOURCE, "c.txt", b"FAIL again")
            .with_object(SOURCE, "d.txt", b"fine too");
        let ctx = context(objects, Box::new(FailingOn { trigger: "FAIL" }));

        let report = BatchDispatcher::new(&ctx)
            .process(&[item("a.txt"), item("b.txt"), item("c.txt"), item("d.txt")])
            .unwrap();

        assert_eq!(report.outcome_code, OutcomeCode::SevereFailure);
        assert_eq!(report.succeeded_count(), 2);
        assert_eq!(report.failed_count(), 2);
        assert!(matches!(
            report.items[0].outcome,
            ItemOutcome::Failed {
                stage: ItemStage::Analyzing,
                class: FailureClass::Severe,
                ..
            }
        ));
        assert_eq!(
            ctx.metadata.get("d").unwrap().unwrap().status.status,
            ItemStatus::Processed
        );
    }

    #[test]
    fn missing_source_is_recoverable() {
        let ctx = context(MemoryObjectStore::new(), Box::new(MockLlmClient::new(ANALYSIS_JSON)));

        let report = BatchDispatcher::new(&ctx).process(&[item("ghost.txt")]).unwrap();

        assert_eq!(report.outcome_code, OutcomeCode::PartialFailure);
        let row = ctx.metadata.get("ghost").unwrap().unwrap();
        assert!(row.status.error_message.unwrap().contains("uploads/ghost.txt"));
    }

    #[test]
    fn invalid_utf8_is_recoverable() {
        let objects = MemoryObjectStore::new().with_object(SOURCE, "bad.txt", &[0xff, 0xfe, 0x00]);
        let ctx = context(objects, Box::new(MockLlmClient::new(ANALYSIS_JSON)));

        let report = BatchDispatcher::new(&ctx).process(&[item("bad.txt")]).unwrap();
        assert_eq!(report.outcome_code.code(), 202);
    }

    #[test]
    fn reprocessing_keeps_only_latest_row() {
        let ctx = context(
            MemoryObjectStore::new().with_object(SOURCE, "book1.txt", b"text"),
            Box::new(MockLlmClient::new(ANALYSIS_JSON)),
        );
        let dispatcher = BatchDispatcher::new(&ctx);

        // First attempt: same item id, unsupported extension.
        dispatcher.process(&[item("book1.xyz")]).unwrap();
        assert_eq!(
            ctx.metadata.get("book1").unwrap().unwrap().status.status,
            ItemStatus::Failed
        );

        dispatcher.process(&[item("book1.txt")]).unwrap();
        let row = ctx.metadata.get("book1").unwrap().unwrap();
        assert_eq!(row.status.status, ItemStatus::Processed);
        assert!(row.status.error_message.is_none());
        assert_eq!(ctx.metadata.count().unwrap(), 1);
    }

    #[test]
    fn unparseable_model_output_still_persists() {
        let objects = MemoryObjectStore::new().with_object(SOURCE, "notes.txt", b"some text");
        let ctx = context(objects, Box::new(MockLlmClient::new("Sorry, I cannot do that.")));

        let report = BatchDispatcher::new(&ctx).process(&[item("notes.txt")]).unwrap();

        assert_eq!(report.outcome_code, OutcomeCode::Succeeded);
        assert!(matches!(
            report.items[0].outcome,
            ItemOutcome::Succeeded { fallback: true, .. }
        ));
        let analysis = ctx.metadata.get("notes").unwrap().unwrap().analysis.unwrap();
        assert_eq!(analysis.title, "notes");
        assert_eq!(analysis.raw_model_text.as_deref(), Some("Sorry, I cannot do that."));
    }

    #[test]
    fn empty_batch_succeeds() {
        let ctx = context(MemoryObjectStore::new(), Box::new(MockLlmClient::new(ANALYSIS_JSON)));
        let report = BatchDispatcher::new(&ctx).process(&[]).unwrap();
        assert_eq!(report.outcome_code.code(), 200);
        assert!(report.items.is_empty());
    }

    #[test]
    fn status_write_failure_aborts_batch() {
        let ctx = PipelineContext::new(
            PipelineConfig::with_data_dir(PathBuf::from("/unused")),
            Box::new(MemoryObjectStore::new()),
            Box::new(BrokenMetadata),
            Box::new(MockLlmClient::new(ANALYSIS_JSON)),
        );

        let result = BatchDispatcher::new(&ctx).process(&[item("book.xyz"), item("other.txt")]);
        assert!(matches!(
            result,
            Err(DispatchError::StatusWrite { ref item_id, .. }) if item_id == "book"
        ));
    }

    #[test]
    fn items_processed_in_input_order() {
        let objects = MemoryObjectStore::new()
            .with_object(SOURCE, "z.txt", b"z")
            .with_object(SOURCE, "a.txt", b"a");
        let ctx = context(objects, Box::new(MockLlmClient::new(ANALYSIS_JSON)));

        let report = BatchDispatcher::new(&ctx)
            .process(&[item("z.txt"), item("a.txt")])
            .unwrap();
        let ids: Vec<&str> = report.items.iter().map(|r| r.item_id.as_str()).collect();
        assert_eq!(ids, ["z", "a"]);
    }

    #[test]
    fn malformed_pdf_fails_alone() {
        let bad_pdf = crate::pipeline::extraction::pdf::tests::make_pdf_with_streams(&[
            "BT /F9 12 Tf 100 700 Td (Lost) Tj ET".into(),
        ]);
        let objects = MemoryObjectStore::new()
            .with_object(SOURCE, "bad.pdf", &bad_pdf)
            .with_object(SOURCE, "good.txt", b"A quiet harbour town.");
        let ctx = context(objects, Box::new(MockLlmClient::new(ANALYSIS_JSON)));

        let report = BatchDispatcher::new(&ctx)
            .process(&[item("bad.pdf"), item("good.txt")])
            .unwrap();

        assert_eq!(report.outcome_code.code(), 202);
        assert!(matches!(
            report.items[0].outcome,
            ItemOutcome::Failed {
                stage: ItemStage::Extracting,
                class: FailureClass::Recoverable,
                ..
            }
        ));

        let bad = ctx.metadata.get("bad").unwrap().unwrap();
        assert_eq!(bad.status.status, ItemStatus::Failed);
        let message = bad.status.error_message.unwrap();
        assert!(message.starts_with("extracting failed"), "message was: {message}");
        assert!(message.contains("PDF parsing failed"), "message was: {message}");

        let good = ctx.metadata.get("good").unwrap().unwrap();
        assert_eq!(good.status.status, ItemStatus::Processed);
    }

    #[test]
    fn companion_write_failure_is_severe_persisting_failure() {
        let objects = ReadOnlyObjects {
            inner: MemoryObjectStore::new().with_object(SOURCE, "book1.txt", b"Salt and rope."),
        };
        let ctx = PipelineContext::new(
            PipelineConfig::with_data_dir(PathBuf::from("/unused")),
            Box::new(objects),
            Box::new(SqliteMetadataStore::open_in_memory().unwrap()),
            Box::new(MockLlmClient::new(ANALYSIS_JSON)),
        );

        let report = BatchDispatcher::new(&ctx).process(&[item("book1.txt")]).unwrap();

        assert_eq!(report.outcome_code, OutcomeCode::SevereFailure);
        assert_eq!(report.outcome_code.code(), 500);
        assert!(matches!(
            report.items[0].outcome,
            ItemOutcome::Failed {
                stage: ItemStage::Persisting,
                class: FailureClass::Severe,
                ..
            }
        ));

        let row = ctx.metadata.get("book1").unwrap().unwrap();
        assert_eq!(row.status.status, ItemStatus::Failed);
        assert!(row.analysis.is_none());
        assert!(row.status.processed_key.is_none());
        let message = row.status.error_message.unwrap();
        assert!(message.starts_with("persisting failed"), "message was: {message}");
    }

    #[test]
    fn key_without_extension_is_recoverable() {
        let ctx = context(MemoryObjectStore::new(), Box::new(MockLlmClient::new(ANALYSIS_JSON)));

        let report = BatchDispatcher::new(&ctx).process(&[item("inbox/README")]).unwrap();

        assert_eq!(report.outcome_code.code(), 202);
        let message = ctx.metadata.get("README").unwrap().unwrap().status.error_message.unwrap();
        assert!(message.contains("README"), "message was: {message}");
        assert!(!message.contains("format: ."), "message was: {message}");
    }
}
