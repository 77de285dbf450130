use std::path::Path;

use serde::{Deserialize, Serialize};

/// Book formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookFormat {
    Text,
    Pdf,
}

impl BookFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Pdf => "pdf",
        }
    }

    /// Resolve a format from a file extension. Matching ignores case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "txt" => Some(Self::Text),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

/// Format declared by a source key's extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredFormat {
    Known(BookFormat),
    /// Extension as written in the key.
    Unsupported(String),
    /// The file name has no extension at all; carries the file name.
    MissingExtension(String),
}

impl DeclaredFormat {
    /// The extension is everything after the last `.` of the file name, so
    /// dot-files such as `dir/.txt` still declare `txt`.
    pub fn from_key(key: &str) -> Self {
        let file_name = Path::new(key)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(key);

        match file_name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => match BookFormat::from_extension(ext) {
                Some(format) => Self::Known(format),
                None => Self::Unsupported(ext.to_string()),
            },
            _ => Self::MissingExtension(file_name.to_string()),
        }
    }
}

/// One unit of work: a single uploaded book referenced by an event record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookItem {
    /// Source file name without directory or extension.
    pub item_id: String,
    /// Container (bucket) the source object lives in.
    pub container: String,
    pub source_key: String,
    pub format: DeclaredFormat,
}

impl BookItem {
    pub fn from_object(container: &str, source_key: &str) -> Self {
        Self {
            item_id: item_id_for_key(source_key),
            container: container.to_string(),
            source_key: source_key.to_string(),
            format: DeclaredFormat::from_key(source_key),
        }
    }
}

/// Derive the item identifier from an object key: file name, extension stripped.
pub fn item_id_for_key(key: &str) -> String {
    Path::new(key)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(key)
        .to_string()
}
