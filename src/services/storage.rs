// src/services/storage.rs
use crate::errors::UploadError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::RwLock;

/// String key-value storage backing the history ledger.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, UploadError>;
    async fn set(&self, key: &str, value: String) -> Result<(), UploadError>;
    async fn remove(&self, key: &str) -> Result<(), UploadError>;
}

#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, UploadError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), UploadError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), UploadError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Keeps every key as one JSON object in a single file.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_all(&self) -> Result<HashMap<String, String>, UploadError> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(HashMap::new());
        }

        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| UploadError::Storage(format!("Failed to read {}: {}", self.path.display(), e)))?;

        match serde_json::from_str(&content) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                log::warn!("Ignoring unreadable store file {}: {}", self.path.display(), e);
                Ok(HashMap::new())
            }
        }
    }

    async fn write_all(&self, entries: &HashMap<String, String>) -> Result<(), UploadError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| UploadError::Storage(format!("Failed to create data directory: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, content)
            .await
            .map_err(|e| UploadError::Storage(format!("Failed to write {}: {}", self.path.display(), e)))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, UploadError> {
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), UploadError> {
        let mut entries = self.read_all().await?;
        entries.insert(key.to_string(), value);
        self.write_all(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), UploadError> {
        let mut entries = self.read_all().await?;
        if entries.remove(key).is_some() {
            self.write_all(&entries).await?;
        }
        Ok(())
    }
}
