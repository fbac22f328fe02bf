//! Blob storage abstraction
//!
//! Blobs are addressed by `<kind>/<file id>` paths. The filesystem
//! implementation maps those onto a directory under the configured blob
//! root; the in-memory implementation backs tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{BlobError, Result};

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, path: &str, contents: &[u8]) -> Result<()>;

    async fn get(&self, path: &str) -> Result<Vec<u8>>;

    async fn exists(&self, path: &str) -> Result<bool>;

    /// Deleting a missing blob is not an error; collaborators retry
    /// deletions after partial failures.
    async fn delete(&self, path: &str) -> Result<()>;

    async fn download_to(&self, path: &str, dest: &Path) -> Result<()>;
}

pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        if path.is_empty() || path.split('/').any(|seg| seg.is_empty() || seg == ".." || seg == ".")
        {
            return Err(BlobError::InvalidPath {
                path: path.to_string(),
            }
            .into());
        }
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn upload(&self, path: &str, contents: &[u8]) -> Result<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full, contents).await?;
        debug!("Uploaded blob {} ({} bytes)", path, contents.len());
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.resolve(path)?;
        match tokio::fs::read(&full).await {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(BlobError::NotFound {
                path: path.to_string(),
            }
            .into()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let full = self.resolve(path)?;
        Ok(tokio::fs::try_exists(&full).await?)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full = self.resolve(path)?;
        match tokio::fs::remove_file(&full).await {
            Ok(()) => {
                debug!("Deleted blob {}", path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn download_to(&self, path: &str, dest: &Path) -> Result<()> {
        let contents = self.get(path).await?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, contents).await?;
        Ok(())
    }
}

/// In-memory store used by tests.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.lock().is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.blobs.lock().contains_key(path)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, path: &str, contents: &[u8]) -> Result<()> {
        self.blobs.lock().insert(path.to_string(), contents.to_vec());
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>> {
        self.blobs
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| {
                BlobError::NotFound {
                    path: path.to_string(),
                }
                .into()
            })
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.blobs.lock().contains_key(path))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.blobs.lock().remove(path);
        Ok(())
    }

    async fn download_to(&self, path: &str, dest: &Path) -> Result<()> {
        let contents = self.get(path).await?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, contents).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fs_store_round_trips_blobs() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FsBlobStore::new(dir.path());

        store.upload("data/abc", b"contents").await.unwrap();
        assert!(store.exists("data/abc").await.unwrap());
        assert_eq!(store.get("data/abc").await.unwrap(), b"contents");

        store.delete("data/abc").await.unwrap();
        assert!(!store.exists("data/abc").await.unwrap());
        // Deleting again is not an error.
        store.delete("data/abc").await.unwrap();
    }

    #[tokio::test]
    async fn test_fs_store_missing_blob_is_not_found() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FsBlobStore::new(dir.path());

        let err = store.get("image/missing").await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::StatDeskError::Blob(BlobError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_fs_store_rejects_traversal_paths() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FsBlobStore::new(dir.path());

        for path in ["../escape", "data/../../escape", "", "data//x", "./x"] {
            let err = store.upload(path, b"x").await.unwrap_err();
            assert!(matches!(
                err,
                crate::error::StatDeskError::Blob(BlobError::InvalidPath { .. })
            ));
        }
    }

    #[tokio::test]
    async fn test_download_to_writes_the_blob() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FsBlobStore::new(dir.path().join("blobs"));
        store.upload("ancillary/report", b"pdf bytes").await.unwrap();

        let dest = dir.path().join("out/report.pdf");
        store.download_to("ancillary/report", &dest).await.unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"pdf bytes");
    }
}
