use super::parser::parse_analysis;
use super::prompt::{build_analysis_prompt, ANALYSIS_SYSTEM_PROMPT};
use super::types::{AnalysisOutcome, LlmClient, ModelRequest};
use super::AnalysisError;

/// Runs one book through the model:
/// prompt → LLM → parse (with fallback) → outcome
pub struct BookAnalyzer<'a> {
    llm: &'a dyn LlmClient,
}

impl<'a> BookAnalyzer<'a> {
    pub fn new(llm: &'a dyn LlmClient) -> Self {
        Self { llm }
    }

    /// Analyse the full text of one book.
    ///
    /// Service failures propagate; unparseable output does not.
    pub fn analyze(&self, text: &str, item_id: &str) -> Result<AnalysisOutcome, AnalysisError> {
        let _span =
            tracing::info_span!("analyze_book", item_id, text_chars = text.len()).entered();

        let prompt = build_analysis_prompt(text);
        let request = ModelRequest {
            system: ANALYSIS_SYSTEM_PROMPT,
            prompt: &prompt,
        };

        let response = self.llm.generate(&request).map_err(|e| {
            tracing::error!(item_id, error = %e, "Model call failed");
            e
        })?;
        let raw_text = response.text();

        let outcome = parse_analysis(&raw_text, item_id);
        tracing::info!(
            item_id,
            fallback = outcome.is_fallback(),
            key_events = outcome.record().key_events.len(),
            "Book analysis complete"
        );
        Ok(outcome)
    }
}
