//! Attachment byte storage.

use std::collections::HashMap;
use std::path::{Component as PathComponent, Path, PathBuf};
use std::sync::RwLock;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;

use crate::kernel::traits::BaseFileStorage;

/// Files under a root directory, one file per key.
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, PathComponent::Normal(_)));
        if key.is_empty() || escapes {
            return Err(anyhow!("invalid file key: {}", key));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BaseFileStorage for LocalFileStorage {
    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key)?;
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))
    }

    async fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}

/// Storage kept in memory, for tests.
#[derive(Default)]
pub struct MemoryFileStorage {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryFileStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.files
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(key)
    }
}

#[async_trait]
impl BaseFileStorage for MemoryFileStorage {
    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        self.files
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow!("file not found: {}", key))
    }

    async fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.files
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_keys_escaping_root() {
        let storage = LocalFileStorage::new("/tmp/fictions");
        assert!(storage.path_for("../etc/passwd").is_err());
        assert!(storage.path_for("/etc/passwd").is_err());
        assert!(storage.path_for("").is_err());
        assert_eq!(
            storage.path_for("a/b.pdf").unwrap(),
            PathBuf::from("/tmp/fictions/a/b.pdf")
        );
    }

    #[tokio::test]
    async fn test_memory_storage_round_trip() {
        let storage = MemoryFileStorage::new();
        storage.write("k", b"bytes").await.unwrap();
        assert_eq!(storage.read("k").await.unwrap(), b"bytes".to_vec());
        assert!(storage.read("missing").await.is_err());
    }
}
