pub mod object_store;
pub mod metadata_store;
pub mod gateway;
pub mod status;

pub use object_store::*;
pub use metadata_store::*;
pub use gateway::*;
pub use status::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Object not found: {container}/{key}")]
    NotFound { container: String, key: String },

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },
}
