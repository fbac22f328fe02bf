//! Image management for release content
//!
//! Uploading returns the path fragment authors embed in html bodies; the
//! approval path later deletes any image no body references any more.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::core::data::Database;
use crate::core::infrastructure::BlobStore;
use crate::core::model::{FileKind, FileReference, ReleaseFileInfo, ReleaseFileLink};
use crate::error::{Result, StatDeskError};

pub struct ImageService {
    db: Arc<Database>,
    blobs: Arc<dyn BlobStore>,
}

impl ImageService {
    pub fn new(db: Arc<Database>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { db, blobs }
    }

    /// Store an image and link it to the release. Returns the file and the
    /// path fragment to use in html bodies.
    pub async fn upload(
        &self,
        release_id: Uuid,
        filename: &str,
        content_type: &str,
        contents: &[u8],
        actor: &str,
    ) -> Result<(FileReference, String)> {
        self.require_release(release_id)?;
        let file = FileReference {
            id: Uuid::new_v4(),
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            size: contents.len() as i64,
            kind: FileKind::Image,
            source_archive_id: None,
            paired_file_id: None,
            replacing_id: None,
            replaced_by_id: None,
            created_by: actor.to_string(),
            created_at: Utc::now(),
        };
        self.blobs.upload(&file.blob_path(), contents).await?;
        self.db.insert_file(&file)?;
        self.db.insert_release_file(&ReleaseFileLink {
            id: Uuid::new_v4(),
            release_id,
            file_id: file.id,
            name: None,
            ord: 0,
        })?;
        let path = file.blob_path();
        info!("Uploaded image {} to release {}", filename, release_id);
        Ok((file, path))
    }

    pub async fn list(&self, release_id: Uuid) -> Result<Vec<ReleaseFileInfo>> {
        self.require_release(release_id)?;
        self.db.list_release_files(release_id, Some(FileKind::Image))
    }

    /// Unlink an image; the blob and row only go once no release links it.
    pub async fn delete(&self, release_id: Uuid, file_id: Uuid) -> Result<()> {
        let info = self
            .db
            .get_release_file(release_id, file_id)?
            .ok_or(StatDeskError::NotFound)?;
        if info.file.kind != FileKind::Image {
            return Err(StatDeskError::NotFound);
        }
        self.db.delete_release_file_link(release_id, file_id)?;
        if self.db.count_file_links(file_id)? == 0 {
            self.blobs.delete(&info.file.blob_path()).await?;
            self.db.delete_file_row(file_id)?;
        }
        info!("Deleted image {} from release {}", file_id, release_id);
        Ok(())
    }

    fn require_release(&self, release_id: Uuid) -> Result<()> {
        self.db
            .get_release(release_id)?
            .map(|_| ())
            .ok_or(StatDeskError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::infrastructure::MemoryBlobStore;
    use crate::core::test_support::{content_db, seed_publication, seed_release};

    fn fixture() -> (Arc<Database>, Arc<MemoryBlobStore>, ImageService, Uuid) {
        let db = content_db();
        let publication = seed_publication(&db);
        let release = seed_release(&db, &publication);
        let blobs = Arc::new(MemoryBlobStore::new());
        let service = ImageService::new(db.clone(), blobs.clone());
        (db, blobs, service, release.id)
    }

    #[tokio::test]
    async fn test_upload_returns_embeddable_path() {
        let (_db, blobs, service, release_id) = fixture();
        let (file, path) = service
            .upload(release_id, "chart.png", "image/png", b"png", "author@example.test")
            .await
            .unwrap();

        assert_eq!(path, format!("image/{}", file.id));
        assert!(blobs.contains(&path));
    }

    #[tokio::test]
    async fn test_delete_respects_shared_links() {
        let (db, blobs, service, release_id) = fixture();
        let (file, path) = service
            .upload(release_id, "chart.png", "image/png", b"png", "author@example.test")
            .await
            .unwrap();

        // Second release still links the image.
        let other = seed_release(&db, &seed_publication(&db));
        db.insert_release_file(&ReleaseFileLink {
            id: Uuid::new_v4(),
            release_id: other.id,
            file_id: file.id,
            name: None,
            ord: 0,
        })
        .unwrap();

        service.delete(release_id, file.id).await.unwrap();
        assert!(db.get_file(file.id).unwrap().is_some());
        assert!(blobs.contains(&path));

        service.delete(other.id, file.id).await.unwrap();
        assert!(db.get_file(file.id).unwrap().is_none());
        assert!(!blobs.contains(&path));
    }
}
