use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "BookLens";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_PROCESSED_CONTAINER: &str = "processed-books";
pub const DEFAULT_MODEL_ENDPOINT: &str = "http://localhost:8080";
pub const DEFAULT_MODEL_ID: &str = "anthropic.claude-3-sonnet-20240229-v1:0";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "booklens=info"
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Cannot determine home directory; set BOOKLENS_DATA_DIR")]
    NoHomeDir,

    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

/// Settings for the hosted language model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    pub endpoint: String,
    pub model_id: String,
    /// Never serialized, so `booklens config` output is safe to share.
    #[serde(skip)]
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_MODEL_ENDPOINT.into(),
            model_id: DEFAULT_MODEL_ID.into(),
            api_key: None,
            max_tokens: 4096,
            temperature: 1.0,
            top_p: 0.9,
            timeout_secs: 300,
        }
    }
}

/// Runtime configuration for one pipeline process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root for object containers and the metadata database.
    pub data_dir: PathBuf,
    /// Container receiving companion text objects.
    pub processed_container: String,
    pub model: ModelSettings,
}

impl PipelineConfig {
    /// Defaults rooted at `data_dir`.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            processed_container: DEFAULT_PROCESSED_CONTAINER.into(),
            model: ModelSettings::default(),
        }
    }

    /// Load from `BOOKLENS_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load from an arbitrary variable lookup. Unset or empty variables
    /// keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let data_dir = match get("BOOKLENS_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };

        let mut config = Self::with_data_dir(data_dir);

        if let Some(container) = get("BOOKLENS_PROCESSED_CONTAINER") {
            config.processed_container = container;
        }
        if let Some(endpoint) = get("BOOKLENS_MODEL_ENDPOINT") {
            config.model.endpoint = endpoint;
        }
        if let Some(model_id) = get("BOOKLENS_MODEL_ID") {
            config.model.model_id = model_id;
        }
        config.model.api_key = get("BOOKLENS_API_KEY");

        if let Some(v) = get("BOOKLENS_MAX_TOKENS") {
            config.model.max_tokens = parse_var("BOOKLENS_MAX_TOKENS", &v)?;
        }
        if let Some(v) = get("BOOKLENS_TEMPERATURE") {
            config.model.temperature = parse_var("BOOKLENS_TEMPERATURE", &v)?;
        }
        if let Some(v) = get("BOOKLENS_TOP_P") {
            config.model.top_p = parse_var("BOOKLENS_TOP_P", &v)?;
        }
        if let Some(v) = get("BOOKLENS_TIMEOUT_SECS") {
            config.model.timeout_secs = parse_var("BOOKLENS_TIMEOUT_SECS", &v)?;
        }

        Ok(config)
    }

    /// Directory holding one sub-directory per object container.
    pub fn objects_dir(&self) -> PathBuf {
        self.data_dir.join("objects")
    }

    pub fn metadata_db_path(&self) -> PathBuf {
        self.data_dir.join("metadata.db")
    }
}

/// ~/BookLens/ unless overridden.
pub fn default_data_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(APP_NAME))
        .ok_or(ConfigError::NoHomeDir)
}

fn parse_var<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        var,
        value: value.to_string(),
    })
}
