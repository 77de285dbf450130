use serde::Deserialize;

use super::types::AnalysisOutcome;
use crate::models::{scalar_to_string, AnalysisRecord, Protagonist, NOT_AVAILABLE, UNKNOWN_GENRE};

/// Maximum characters of unparsed model output kept on a fallback record.
pub const FALLBACK_RAW_TEXT_CHARS: usize = 200;

/// Parse model output into an analysis record.
///
/// Output that is not a JSON object produces a deterministic fallback
/// record instead of an error.
pub fn parse_analysis(raw_text: &str, item_id: &str) -> AnalysisOutcome {
    match parse_analysis_json(raw_text) {
        Ok(record) => AnalysisOutcome::Parsed(record),
        Err(reason) => {
            tracing::warn!(
                item_id,
                reason = reason.as_str(),
                response_length = raw_text.len(),
                "Model output is not a JSON object, using fallback analysis"
            );
            AnalysisOutcome::Fallback {
                record: fallback_record(item_id, raw_text),
                raw_text: raw_text.to_string(),
            }
        }
    }
}

/// Minimal record used when model output cannot be parsed.
pub fn fallback_record(item_id: &str, raw_text: &str) -> AnalysisRecord {
    AnalysisRecord {
        title: item_id.to_string(),
        author: NOT_AVAILABLE.into(),
        genre: NOT_AVAILABLE.into(),
        protagonist: None,
        worldbuilding: NOT_AVAILABLE.into(),
        temporal_spatial_setting: NOT_AVAILABLE.into(),
        plot_summary: NOT_AVAILABLE.into(),
        key_events: Vec::new(),
        ending_summary: NOT_AVAILABLE.into(),
        book_overview: NOT_AVAILABLE.into(),
        raw_model_text: Some(truncate_chars(raw_text, FALLBACK_RAW_TEXT_CHARS)),
    }
}

/// First `max_chars` characters of `s`, never splitting a character.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// Top-level fields kept as raw values so one malformed field cannot sink
/// the rest of the record.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnalysis {
    title: Option<serde_json::Value>,
    author: Option<serde_json::Value>,
    genre: Option<serde_json::Value>,
    protagonist: Option<serde_json::Value>,
    worldbuilding: Option<serde_json::Value>,
    temporal_spatial_setting: Option<serde_json::Value>,
    plot_summary: Option<serde_json::Value>,
    key_events: Option<serde_json::Value>,
    ending_summary: Option<serde_json::Value>,
    book_overview: Option<serde_json::Value>,
}

fn parse_analysis_json(raw_text: &str) -> Result<AnalysisRecord, String> {
    let value: serde_json::Value = serde_json::from_str(raw_text).map_err(|e| e.to_string())?;
    if !value.is_object() {
        return Err("top-level JSON value is not an object".into());
    }

    let raw: RawAnalysis = serde_json::from_value(value).map_err(|e| e.to_string())?;

    let protagonist = raw
        .protagonist
        .filter(|v| v.is_object())
        .and_then(|v| serde_json::from_value::<Protagonist>(v).ok())
        .filter(|p| !p.is_empty());

    Ok(AnalysisRecord {
        title: text_or(raw.title.as_ref(), NOT_AVAILABLE),
        author: text_or(raw.author.as_ref(), NOT_AVAILABLE),
        genre: text_or(raw.genre.as_ref(), UNKNOWN_GENRE),
        protagonist,
        worldbuilding: text_or(raw.worldbuilding.as_ref(), ""),
        temporal_spatial_setting: text_or(raw.temporal_spatial_setting.as_ref(), ""),
        plot_summary: text_or(raw.plot_summary.as_ref(), ""),
        key_events: parse_array_lenient(
            raw.key_events
                .as_ref()
                .and_then(|v| v.as_array())
                .map(|a| a.as_slice()),
        ),
        ending_summary: text_or(raw.ending_summary.as_ref(), ""),
        book_overview: text_or(raw.book_overview.as_ref(), ""),
        raw_model_text: None,
    })
}

/// Scalar field as text, or `default` when missing, null, blank or not a scalar.
fn text_or(value: Option<&serde_json::Value>, default: &str) -> String {
    scalar_to_string(value)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Parse an array leniently, skipping items that fail to deserialize.
fn parse_array_lenient<T: for<'de> Deserialize<'de>>(
    items: Option<&[serde_json::Value]>,
) -> Vec<T> {
    match items {
        None => vec![],
        Some(arr) => arr
            .iter()
            .filter_map(|v| serde_json::from_value(v.clone()).ok())
            .collect(),
    }
}
