use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use super::types::{PageText, PdfExtractor};
use super::ExtractionError;

/// PDF text extractor using the pdf-extract crate.
/// Handles digital PDFs with embedded text layers; scanned pages yield empty text.
///
/// pdf-extract panics on some malformed content streams (unknown font
/// resources, text operators before `Tf`). Those panics are caught here and
/// reported as [`ExtractionError::PdfParsing`] so one bad upload fails only
/// its own item.
pub struct PdfTextExtractor;

impl PdfExtractor for PdfTextExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
        let outcome =
            catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem_by_pages(pdf_bytes)));

        match outcome {
            Ok(Ok(pages)) => Ok(pages),
            Ok(Err(e)) => Err(ExtractionError::PdfParsing(e.to_string())),
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                tracing::warn!(reason = reason.as_str(), "PDF parser panicked");
                Err(ExtractionError::PdfParsing(format!("malformed PDF content: {reason}")))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Number raw page texts in order. Page text is kept verbatim, so a page
/// with nothing extractable contributes whatever the parser yields for it
/// (normally `""`); no page is dropped.
pub fn normalize_pages(raw_pages: Vec<String>) -> Vec<PageText> {
    raw_pages
        .into_iter()
        .enumerate()
        .map(|(i, text)| PageText {
            page_number: i + 1,
            text,
        })
        .collect()
}
