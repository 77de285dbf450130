//! Collaborators shared by every stage of one invocation.
//!
//! Built once at startup and passed by reference; nothing in the pipeline
//! reaches for module-level clients.

use thiserror::Error;

use crate::config::PipelineConfig;
use crate::pipeline::analysis::{AnalysisError, HttpModelClient, LlmClient};
use crate::pipeline::storage::{
    FsObjectStore, MetadataStore, ObjectStore, SqliteMetadataStore, StorageError,
};

#[derive(Error, Debug)]
pub enum ContextError {
    #[error("Storage setup failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Model client setup failed: {0}")]
    Model(#[from] AnalysisError),
}

pub struct PipelineContext {
    pub config: PipelineConfig,
    pub objects: Box<dyn ObjectStore>,
    pub metadata: Box<dyn MetadataStore>,
    pub llm: Box<dyn LlmClient>,
}

impl PipelineContext {
    pub fn new(
        config: PipelineConfig,
        objects: Box<dyn ObjectStore>,
        metadata: Box<dyn MetadataStore>,
        llm: Box<dyn LlmClient>,
    ) -> Self {
        Self {
            config,
            objects,
            metadata,
            llm,
        }
    }

    /// Filesystem objects, SQLite metadata and the HTTP model client, all
    /// rooted at the configured data directory.
    pub fn from_config(config: PipelineConfig) -> Result<Self, ContextError> {
        let objects = FsObjectStore::new(&config.objects_dir());
        let metadata = SqliteMetadataStore::open(&config.metadata_db_path())?;
        let llm = HttpModelClient::new(&config.model)?;

        tracing::info!(
            data_dir = %config.data_dir.display(),
            model_id = config.model.model_id.as_str(),
            "Pipeline context ready"
        );

        Ok(Self::new(
            config,
            Box::new(objects),
            Box::new(metadata),
            Box::new(llm),
        ))
    }
}
