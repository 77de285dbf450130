pub mod types;
pub mod prompt;
pub mod parser;
pub mod client;
pub mod orchestrator;

pub use types::*;
pub use prompt::*;
pub use parser::*;
pub use client::*;
pub use orchestrator::*;

use thiserror::Error;

/// Failures of the model call itself. Unparseable model output is not an
/// error; it yields [`AnalysisOutcome::Fallback`].
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Model service is not reachable at {0}")]
    Connection(String),

    #[error("Model service returned error (status {status}): {body}")]
    ServiceStatus { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Unrecognized model response shape: {0}")]
    UnrecognizedResponse(String),

    #[error("Failed to encode model request: {0}")]
    RequestEncoding(#[from] serde_json::Error),
}
