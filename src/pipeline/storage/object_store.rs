use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use super::StorageError;

/// Opaque get/put object storage, addressed by container and key.
pub trait ObjectStore {
    fn get(&self, container: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Write an object, replacing any existing one at the same key.
    fn put(&self, container: &str, key: &str, bytes: &[u8]) -> Result<(), StorageError>;
}

/// Filesystem-backed store: each container is a directory under `root`.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// Resolve `container/key` under the root, refusing keys that escape it.
    fn object_path(&self, container: &str, key: &str) -> Result<PathBuf, StorageError> {
        let container_path = Path::new(container);
        let key_path = Path::new(key);
        let is_safe = |p: &Path| {
            !p.as_os_str().is_empty() && p.components().all(|c| matches!(c, Component::Normal(_)))
        };

        if !is_safe(container_path) {
            return Err(StorageError::InvalidKey(container.to_string()));
        }
        if !is_safe(key_path) {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        Ok(self.root.join(container_path).join(key_path))
    }
}

impl ObjectStore for FsObjectStore {
    fn get(&self, container: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.object_path(container, key)?;
        std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound {
                container: container.to_string(),
                key: key.to_string(),
            },
            _ => StorageError::Io(e),
        })
    }

    fn put(&self, container: &str, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.object_path(container, key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, bytes)?;
        tracing::debug!(container, key, bytes = bytes.len(), "Object written");
        Ok(())
    }
}

/// In-memory store for tests and dry runs.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(self, container: &str, key: &str, bytes: &[u8]) -> Self {
        self.lock()
            .insert((container.to_string(), key.to_string()), bytes.to_vec());
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(String, String), Vec<u8>>> {
        self.objects.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ObjectStore for MemoryObjectStore {
    fn get(&self, container: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        self.lock()
            .get(&(container.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                container: container.to_string(),
                key: key.to_string(),
            })
    }

    fn put(&self, container: &str, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        self.lock()
            .insert((container.to_string(), key.to_string()), bytes.to_vec());
        Ok(())
    }
}
