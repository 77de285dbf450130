use super::pdf::{normalize_pages, PdfTextExtractor};
use super::text::extract_plain_text;
use super::types::{ExtractedText, ExtractionMethod, PdfExtractor};
use super::ExtractionError;
use crate::models::{BookFormat, BookItem, DeclaredFormat};
use crate::pipeline::storage::{ObjectStore, StorageError};

/// Dispatches raw book bytes to the extractor for their declared format.
pub struct TextExtractor {
    pdf: Box<dyn PdfExtractor>,
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new(Box::new(PdfTextExtractor))
    }
}

impl TextExtractor {
    pub fn new(pdf: Box<dyn PdfExtractor>) -> Self {
        Self { pdf }
    }

    /// Extract plain text from `bytes` according to `format`.
    pub fn extract(
        &self,
        bytes: Vec<u8>,
        format: BookFormat,
    ) -> Result<ExtractedText, ExtractionError> {
        match format {
            BookFormat::Text => extract_plain_text(bytes),
            BookFormat::Pdf => {
                let pages = normalize_pages(self.pdf.extract_pages(&bytes)?);
                let full_text: String = pages.iter().map(|p| p.text.as_str()).collect();
                Ok(ExtractedText {
                    method: ExtractionMethod::PdfText,
                    pages,
                    full_text,
                })
            }
        }
    }

    /// Read the item's source object and extract its text.
    ///
    /// The declared format is checked before any read, so an unsupported
    /// extension never touches the store.
    pub fn extract_item(
        &self,
        objects: &dyn ObjectStore,
        item: &BookItem,
    ) -> Result<ExtractedText, ExtractionError> {
        let format = match &item.format {
            DeclaredFormat::Known(format) => *format,
            DeclaredFormat::Unsupported(ext) => {
                return Err(ExtractionError::UnsupportedFormat(ext.clone()));
            }
            DeclaredFormat::MissingExtension(file_name) => {
                return Err(ExtractionError::MissingExtension(file_name.clone()));
            }
        };

        let bytes = objects
            .get(&item.container, &item.source_key)
            .map_err(|e| match e {
                StorageError::NotFound { container, key } => {
                    ExtractionError::NotFound(format!("{container}/{key}"))
                }
                other => ExtractionError::SourceRead(other.to_string()),
            })?;

        let extracted = self.extract(bytes, format)?;

        tracing::info!(
            item_id = item.item_id.as_str(),
            format = format.as_str(),
            method = ?extracted.method,
            pages = extracted.page_count(),
            text_length = extracted.full_text.len(),
            "Text extraction complete"
        );

        Ok(extracted)
    }
}
