//! Dispatcher-level error taxonomy.
//!
//! Stage errors are folded into [`ProcessingError`], which is what gets
//! classified and written to the item's `FAILED` row.

use thiserror::Error;

use super::types::FailureClass;
use crate::pipeline::analysis::AnalysisError;
use crate::pipeline::extraction::ExtractionError;
use crate::pipeline::storage::StorageError;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("Source object not found: {0}")]
    NotFound(String),

    #[error("Unsupported file format: .{0} (only txt and pdf are supported)")]
    UnsupportedFormat(String),

    #[error("File {0} has no extension (only txt and pdf are supported)")]
    MissingExtension(String),

    #[error("Text encoding error: {0}")]
    Decoding(String),

    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("Analysis service error: {0}")]
    AnalysisService(#[from] AnalysisError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] StorageError),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl From<ExtractionError> for ProcessingError {
    fn from(e: ExtractionError) -> Self {
        match e {
            ExtractionError::NotFound(key) => Self::NotFound(key),
            ExtractionError::UnsupportedFormat(ext) => Self::UnsupportedFormat(ext),
            ExtractionError::MissingExtension(name) => Self::MissingExtension(name),
            ExtractionError::Decoding(msg) => Self::Decoding(msg),
            ExtractionError::PdfParsing(msg) => Self::PdfParsing(msg),
            ExtractionError::SourceRead(msg) => Self::Unexpected(msg),
        }
    }
}

impl ProcessingError {
    /// Input, format and not-found problems are recoverable; everything
    /// else escalates the batch outcome.
    pub fn class(&self) -> FailureClass {
        match self {
            Self::NotFound(_)
            | Self::UnsupportedFormat(_)
            | Self::MissingExtension(_)
            | Self::Decoding(_)
            | Self::PdfParsing(_) => FailureClass::Recoverable,
            Self::AnalysisService(_) | Self::Persistence(_) | Self::Unexpected(_) => {
                FailureClass::Severe
            }
        }
    }
}

/// Errors that abort the whole invocation.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Failed to record failure status for {item_id}: {source}")]
    StatusWrite {
        item_id: String,
        #[source]
        source: StorageError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_errors_are_recoverable() {
        for e in [
            ExtractionError::NotFound("books/a.txt".into()),
            ExtractionError::UnsupportedFormat("xyz".into()),
            ExtractionError::MissingExtension("README".into()),
            ExtractionError::Decoding("invalid utf-8".into()),
            ExtractionError::PdfParsing("bad xref".into()),
        ] {
            assert_eq!(ProcessingError::from(e).class(), FailureClass::Recoverable);
        }
    }

    #[test]
    fn source_read_failure_is_severe() {
        let e = ProcessingError::from(ExtractionError::SourceRead("disk on fire".into()));
        assert!(matches!(e, ProcessingError::Unexpected(_)));
        assert_eq!(e.class(), FailureClass::Severe);
    }

    #[test]
    fn service_and_storage_errors_are_severe() {
        let service = ProcessingError::from(AnalysisError::Connection("http://x".into()));
        assert_eq!(service.class(), FailureClass::Severe);

        let storage = ProcessingError::from(StorageError::InvalidKey("../x".into()));
        assert_eq!(storage.class(), FailureClass::Severe);
    }

    #[test]
    fn unsupported_format_message_names_extension() {
        let e = ProcessingError::from(ExtractionError::UnsupportedFormat("xyz".into()));
        assert!(e.to_string().contains(".xyz"));
    }
}
