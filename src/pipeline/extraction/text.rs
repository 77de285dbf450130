use super::types::{ExtractedText, ExtractionMethod, PageText};
use super::ExtractionError;

/// Decode a plain-text book. Bytes must be valid UTF-8; the result is the
/// exact decoding with no normalisation.
pub fn extract_plain_text(bytes: Vec<u8>) -> Result<ExtractedText, ExtractionError> {
    let text = String::from_utf8(bytes).map_err(|e| ExtractionError::Decoding(e.to_string()))?;

    Ok(ExtractedText {
        method: ExtractionMethod::PlainTextRead,
        pages: vec![PageText {
            page_number: 1,
            text: text.clone(),
        }],
        full_text: text,
    })
}
