use serde::{Deserialize, Serialize};

use super::AnalysisError;
use crate::models::AnalysisRecord;

/// A single analysis request.
#[derive(Debug, Clone, Copy)]
pub struct ModelRequest<'a> {
    pub system: &'a str,
    pub prompt: &'a str,
}

/// Language model client abstraction (allows mocking).
pub trait LlmClient {
    /// Send one request and block until the full response arrives.
    fn generate(&self, request: &ModelRequest<'_>) -> Result<ModelResponse, AnalysisError>;
}

/// Known response body shapes of the model service.
///
/// Bodies matching none of these fail with
/// [`AnalysisError::UnrecognizedResponse`] instead of being read as empty text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelResponse {
    /// Messages API: ordered content segments.
    Messages { content: Vec<ContentBlock> },
    /// Legacy text-completion API.
    Completion { completion: String },
    /// Generation-list API.
    Generations { generations: Vec<Generation> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    /// Non-text segments (tool use, images) carry no analysis text.
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub text: String,
}

impl ModelResponse {
    /// Decode a raw response body.
    pub fn from_body(body: &str) -> Result<Self, AnalysisError> {
        serde_json::from_str(body).map_err(|e| {
            let preview: String = body.chars().take(120).collect();
            AnalysisError::UnrecognizedResponse(format!("{e}; body starts with: {preview}"))
        })
    }

    /// All text segments concatenated in order.
    pub fn text(&self) -> String {
        match self {
            Self::Messages { content } => content
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    ContentBlock::Other => None,
                })
                .collect(),
            Self::Completion { completion } => completion.clone(),
            Self::Generations { generations } => {
                generations.iter().map(|g| g.text.as_str()).collect()
            }
        }
    }
}

/// Result of analysing one book.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// Model output parsed as a JSON object.
    Parsed(AnalysisRecord),
    /// Model output was not a JSON object; `record` is the deterministic
    /// fallback and `raw_text` the complete unparsed output.
    Fallback { record: AnalysisRecord, raw_text: String },
}

impl AnalysisOutcome {
    pub fn record(&self) -> &AnalysisRecord {
        match self {
            Self::Parsed(record) | Self::Fallback { record, .. } => record,
        }
    }

    pub fn into_record(self) -> AnalysisRecord {
        match self {
            Self::Parsed(record) | Self::Fallback { record, .. } => record,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}
