use serde::{Deserialize, Serialize};

use super::ExtractionError;

/// How text was extracted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExtractionMethod {
    PlainTextRead,
    PdfText,
}

/// Text of a single page, in document order. `text` is empty for pages
/// with no extractable text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageText {
    pub page_number: usize,
    pub text: String,
}

/// Result of text extraction from a single book
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedText {
    pub method: ExtractionMethod,
    pub pages: Vec<PageText>,
    /// Page texts concatenated in page order.
    pub full_text: String,
}

impl ExtractedText {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// PDF text extraction abstraction (allows mocking).
///
/// Implementations return exactly one entry per page, in page order.
pub trait PdfExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, ExtractionError>;
}
