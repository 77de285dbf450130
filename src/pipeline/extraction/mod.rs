pub mod types;
pub mod text;
pub mod pdf;
pub mod orchestrator;

pub use types::*;
pub use text::*;
pub use pdf::*;
pub use orchestrator::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
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

    #[error("Failed to read source object: {0}")]
    SourceRead(String),
}
