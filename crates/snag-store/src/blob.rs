//! Attachment blob storage.
//!
//! The bytes of an attachment live behind [`BlobStore`]; the metadata row
//! lives in the relational store. The filesystem backend stores blobs
//! under sanitized, attachment-id based names so a hostile file name can
//! never traverse outside the upload directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use tokio::fs;

use snag_core::{Error, Result};

/// Storage backend for attachment bytes.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write a blob at the given storage path.
    async fn write(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Read a blob back.
    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Delete a blob. Deleting an absent blob is not an error.
    async fn delete(&self, path: &str) -> Result<()>;

    /// Whether a blob exists at the path.
    async fn exists(&self, path: &str) -> Result<bool>;
}

/// Reject storage paths that could escape the base directory.
fn validate_path(path: &str) -> Result<()> {
    if path.is_empty()
        || path.contains("..")
        || Path::new(path).is_absolute()
        || path.contains('\\')
    {
        return Err(Error::Storage(format!("invalid storage path: {path:?}")));
    }
    Ok(())
}

// ─── Filesystem backend ──────────────────────────────────────────────

/// Filesystem blob store rooted at a base directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    base: PathBuf,
}

impl FsBlobStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn full_path(&self, path: &str) -> Result<PathBuf> {
        validate_path(path)?;
        Ok(self.base.join(path))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        let full = self.full_path(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Storage(format!("create {}: {e}", parent.display())))?;
        }
        fs::write(&full, data)
            .await
            .map_err(|e| Error::Storage(format!("write {}: {e}", full.display())))
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.full_path(path)?;
        fs::read(&full)
            .await
            .map_err(|e| Error::Storage(format!("read {}: {e}", full.display())))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full = self.full_path(path)?;
        match fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(format!("delete {}: {e}", full.display()))),
        }
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let full = self.full_path(path)?;
        fs::try_exists(&full)
            .await
            .map_err(|e| Error::Storage(format!("stat {}: {e}", full.display())))
    }
}

// ─── In-memory backend ───────────────────────────────────────────────

/// Map-backed blob store for tests.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        validate_path(path)?;
        self.blobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_string(), data.to_vec());
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.blobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
            .ok_or_else(|| Error::Storage(format!("no blob at {path:?}")))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.blobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(path);
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self
            .blobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_traversal_rejected() {
        assert!(validate_path("../etc/passwd").is_err());
        assert!(validate_path("/etc/passwd").is_err());
        assert!(validate_path("a\\b").is_err());
        assert!(validate_path("").is_err());
        assert!(validate_path("2026/01/abc.bin").is_ok());
    }

    #[tokio::test]
    async fn test_memory_blob_roundtrip() {
        let store = MemoryBlobStore::new();
        store.write("a/b.bin", b"evidence").await.unwrap();
        assert!(store.exists("a/b.bin").await.unwrap());
        assert_eq!(store.read("a/b.bin").await.unwrap(), b"evidence");
        store.delete("a/b.bin").await.unwrap();
        assert!(!store.exists("a/b.bin").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_blob_delete_absent_is_ok() {
        let store = MemoryBlobStore::new();
        assert!(store.delete("missing.bin").await.is_ok());
    }
}
