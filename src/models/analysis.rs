use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder for scalar fields the model could not determine.
pub const NOT_AVAILABLE: &str = "N/A";
pub const UNKNOWN_GENRE: &str = "Unknown";

/// Structured narrative analysis of one book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisRecord {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub protagonist: Option<Protagonist>,
    pub worldbuilding: String,
    pub temporal_spatial_setting: String,
    pub plot_summary: String,
    pub key_events: Vec<KeyEvent>,
    pub ending_summary: String,
    pub book_overview: String,
    /// Truncated copy of unparseable model output. Only set on fallback records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_model_text: Option<String>,
}

impl Default for AnalysisRecord {
    fn default() -> Self {
        Self {
            title: NOT_AVAILABLE.into(),
            author: NOT_AVAILABLE.into(),
            genre: UNKNOWN_GENRE.into(),
            protagonist: None,
            worldbuilding: String::new(),
            temporal_spatial_setting: String::new(),
            plot_summary: String::new(),
            key_events: Vec::new(),
            ending_summary: String::new(),
            book_overview: String::new(),
            raw_model_text: None,
        }
    }
}

/// Profile of the main character.
///
/// Every field accepts strings, numbers or booleans from the model
/// (`"age": 34` is common) and is normalised to a string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Protagonist {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub age: String,
    #[serde(deserialize_with = "lenient_string")]
    pub gender: String,
    #[serde(deserialize_with = "lenient_string")]
    pub personality: String,
    #[serde(deserialize_with = "lenient_string")]
    pub background: String,
    #[serde(deserialize_with = "lenient_string")]
    pub appearance: String,
    /// Single-line, comma-separated visual descriptor.
    #[serde(deserialize_with = "lenient_string")]
    pub visual_summary: String,
}

impl Protagonist {
    pub fn is_empty(&self) -> bool {
        [
            &self.name,
            &self.age,
            &self.gender,
            &self.personality,
            &self.background,
            &self.appearance,
            &self.visual_summary,
        ]
        .iter()
        .all(|f| f.trim().is_empty())
    }
}

/// A key plot event, in story order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyEvent {
    #[serde(alias = "episode_num")]
    pub episode_num: i64,
    #[serde(alias = "event_summary", alias = "summary")]
    pub event_summary: String,
}

/// Accept any JSON scalar as a string; null and containers become empty.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(scalar_to_string(value.as_ref()).unwrap_or_default())
}

/// Render a JSON scalar as a string. Returns `None` for null, arrays and objects.
pub fn scalar_to_string(value: Option<&serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
