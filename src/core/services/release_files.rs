//! Data and ancillary file management
//!
//! Every upload coordinates three things: the file metadata row, the blob
//! and (for data files) the import-tracking row. Files are attached to
//! releases through link rows; deleting always starts by unlinking, and
//! the underlying artifacts only go once nothing links to them any more.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::core::data::Database;
use crate::core::infrastructure::{BlobStore, ImportTracker};
use crate::core::model::{FileKind, FileReference, ReleaseFileInfo, ReleaseFileLink};
use crate::error::{Result, StatDeskError, ValidationCode};

use super::ordering::{dense_orders, validate_reorder};

pub struct DataFileUpload {
    /// Data set display name.
    pub name: String,
    pub data_filename: String,
    pub data_contents: Vec<u8>,
    pub meta_filename: String,
    pub meta_contents: Vec<u8>,
    /// The archive the pair was extracted from, stored alongside it.
    pub source_archive: Option<(String, Vec<u8>)>,
    /// When set, this upload replaces an existing data file.
    pub replacing_file_id: Option<Uuid>,
}

pub struct ReleaseFileService {
    db: Arc<Database>,
    blobs: Arc<dyn BlobStore>,
    imports: Arc<dyn ImportTracker>,
}

impl ReleaseFileService {
    pub fn new(
        db: Arc<Database>,
        blobs: Arc<dyn BlobStore>,
        imports: Arc<dyn ImportTracker>,
    ) -> Self {
        Self { db, blobs, imports }
    }

    /// Store a data/metadata pair (and optionally their source archive),
    /// link both to the release and queue the import.
    pub async fn upload_data(
        &self,
        release_id: Uuid,
        upload: DataFileUpload,
        actor: &str,
    ) -> Result<ReleaseFileInfo> {
        self.require_release(release_id)?;

        let source_archive_id = match &upload.source_archive {
            Some((filename, contents)) => {
                let archive = FileReference {
                    id: Uuid::new_v4(),
                    filename: filename.clone(),
                    content_type: "application/zip".to_string(),
                    size: contents.len() as i64,
                    kind: FileKind::Archive,
                    source_archive_id: None,
                    paired_file_id: None,
                    replacing_id: None,
                    replaced_by_id: None,
                    created_by: actor.to_string(),
                    created_at: Utc::now(),
                };
                self.blobs.upload(&archive.blob_path(), contents).await?;
                self.db.insert_file(&archive)?;
                Some(archive.id)
            }
            None => None,
        };

        let data_id = Uuid::new_v4();
        let meta_id = Uuid::new_v4();
        let data_file = FileReference {
            id: data_id,
            filename: upload.data_filename.clone(),
            content_type: "text/csv".to_string(),
            size: upload.data_contents.len() as i64,
            kind: FileKind::Data,
            source_archive_id,
            paired_file_id: Some(meta_id),
            replacing_id: upload.replacing_file_id,
            replaced_by_id: None,
            created_by: actor.to_string(),
            created_at: Utc::now(),
        };
        let meta_file = FileReference {
            id: meta_id,
            filename: upload.meta_filename.clone(),
            content_type: "text/csv".to_string(),
            size: upload.meta_contents.len() as i64,
            kind: FileKind::Metadata,
            source_archive_id,
            paired_file_id: Some(data_id),
            replacing_id: None,
            replaced_by_id: None,
            created_by: actor.to_string(),
            created_at: Utc::now(),
        };

        self.blobs
            .upload(&data_file.blob_path(), &upload.data_contents)
            .await?;
        self.blobs
            .upload(&meta_file.blob_path(), &upload.meta_contents)
            .await?;
        self.db.insert_file(&data_file)?;
        self.db.insert_file(&meta_file)?;

        self.db.insert_release_file(&ReleaseFileLink {
            id: Uuid::new_v4(),
            release_id,
            file_id: data_id,
            name: Some(upload.name.clone()),
            ord: self.db.next_data_file_ord(release_id)?,
        })?;
        self.db.insert_release_file(&ReleaseFileLink {
            id: Uuid::new_v4(),
            release_id,
            file_id: meta_id,
            name: None,
            ord: 0,
        })?;

        self.imports.create_import(data_id, 0).await?;

        if let Some(replaced_id) = upload.replacing_file_id {
            self.db.set_file_replaced_by(replaced_id, Some(data_id))?;
        }

        info!(
            "Uploaded data set '{}' ({} + {}) to release {}",
            upload.name, upload.data_filename, upload.meta_filename, release_id
        );
        self.db
            .get_release_file(release_id, data_id)?
            .ok_or_else(|| StatDeskError::NotFound)
    }

    pub async fn list(&self, release_id: Uuid, kind: Option<FileKind>) -> Result<Vec<ReleaseFileInfo>> {
        self.require_release(release_id)?;
        self.db.list_release_files(release_id, kind)
    }

    pub async fn list_data(&self, release_id: Uuid) -> Result<Vec<ReleaseFileInfo>> {
        self.list(release_id, Some(FileKind::Data)).await
    }

    /// Apply a complete new data-file order. Only data files renumber;
    /// other kinds keep their fixed order.
    pub async fn reorder_data(
        &self,
        release_id: Uuid,
        file_ids: Vec<Uuid>,
    ) -> Result<Vec<ReleaseFileInfo>> {
        self.require_release(release_id)?;
        let actual: Vec<Uuid> = self
            .db
            .list_release_files(release_id, Some(FileKind::Data))?
            .iter()
            .map(|info| info.file.id)
            .collect();
        validate_reorder(&file_ids, &actual, ValidationCode::DataFileIdsDifferFromActual)?;
        self.db
            .set_data_file_orders(release_id, &dense_orders(&file_ids))?;
        self.list_data(release_id).await
    }

    /// Unlink a data file from the release; when this was the last link,
    /// also remove the import row, the pair's blobs and rows, and the
    /// source archive if nothing else still depends on it.
    pub async fn delete_data(&self, release_id: Uuid, file_id: Uuid) -> Result<()> {
        let info = self
            .db
            .get_release_file(release_id, file_id)?
            .ok_or(StatDeskError::NotFound)?;
        if info.file.kind != FileKind::Data {
            return Err(StatDeskError::NotFound);
        }
        let file = info.file;

        self.db.delete_release_file_link(release_id, file.id)?;
        if let Some(meta_id) = file.paired_file_id {
            self.db.delete_release_file_link(release_id, meta_id)?;
        }

        if self.db.count_file_links(file.id)? > 0 {
            // Inherited from another version; the shared file survives.
            info!(
                "Unlinked data file {} from release {}; other releases still use it",
                file.id, release_id
            );
            return Ok(());
        }

        self.imports.delete_import(file.id).await?;
        self.blobs.delete(&file.blob_path()).await?;
        self.db.delete_file_row(file.id)?;

        if let Some(meta_id) = file.paired_file_id {
            if self.db.count_file_links(meta_id)? == 0 {
                if let Some(meta) = self.db.get_file(meta_id)? {
                    self.blobs.delete(&meta.blob_path()).await?;
                    self.db.delete_file_row(meta.id)?;
                }
            }
        }

        if let Some(archive_id) = file.source_archive_id {
            if self.db.count_files_with_source_archive(archive_id)? == 0 {
                if let Some(archive) = self.db.get_file(archive_id)? {
                    self.blobs.delete(&archive.blob_path()).await?;
                    self.db.delete_file_row(archive.id)?;
                }
            }
        }

        // Whichever side of a replacement chain this file was on, the
        // other side's pointer is now stale.
        if let Some(replaced_id) = file.replacing_id {
            self.db.set_file_replaced_by(replaced_id, None)?;
        }
        if let Some(replacement_id) = file.replaced_by_id {
            self.db.set_file_replacing(replacement_id, None)?;
        }

        info!("Deleted data file {} from release {}", file.id, release_id);
        Ok(())
    }

    pub async fn upload_ancillary(
        &self,
        release_id: Uuid,
        name: &str,
        filename: &str,
        contents: &[u8],
        actor: &str,
    ) -> Result<ReleaseFileInfo> {
        self.require_release(release_id)?;
        let file = FileReference {
            id: Uuid::new_v4(),
            filename: filename.to_string(),
            content_type: "application/octet-stream".to_string(),
            size: contents.len() as i64,
            kind: FileKind::Ancillary,
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
            name: Some(name.to_string()),
            ord: 0,
        })?;
        info!("Uploaded ancillary file {} to release {}", filename, release_id);
        self.db
            .get_release_file(release_id, file.id)?
            .ok_or_else(|| StatDeskError::NotFound)
    }

    pub async fn delete_ancillary(&self, release_id: Uuid, file_id: Uuid) -> Result<()> {
        let info = self
            .db
            .get_release_file(release_id, file_id)?
            .ok_or(StatDeskError::NotFound)?;
        if info.file.kind != FileKind::Ancillary {
            return Err(StatDeskError::NotFound);
        }
        self.db.delete_release_file_link(release_id, file_id)?;
        if self.db.count_file_links(file_id)? == 0 {
            self.blobs.delete(&info.file.blob_path()).await?;
            self.db.delete_file_row(file_id)?;
        }
        info!("Deleted ancillary file {} from release {}", file_id, release_id);
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
    use crate::core::infrastructure::{MemoryBlobStore, MemoryImportTracker};
    use crate::core::test_support::{content_db, seed_publication, seed_release};

    struct Fixture {
        db: Arc<Database>,
        blobs: Arc<MemoryBlobStore>,
        imports: Arc<MemoryImportTracker>,
        service: ReleaseFileService,
        release_id: Uuid,
    }

    fn fixture() -> Fixture {
        let db = content_db();
        let publication = seed_publication(&db);
        let release = seed_release(&db, &publication);
        let blobs = Arc::new(MemoryBlobStore::new());
        let imports = Arc::new(MemoryImportTracker::new());
        let service = ReleaseFileService::new(db.clone(), blobs.clone(), imports.clone());
        Fixture {
            db,
            blobs,
            imports,
            service,
            release_id: release.id,
        }
    }

    fn upload(name: &str, with_archive: bool) -> DataFileUpload {
        DataFileUpload {
            name: name.to_string(),
            data_filename: format!("{name}.csv"),
            data_contents: b"col\n1\n".to_vec(),
            meta_filename: format!("{name}.meta.csv"),
            meta_contents: b"col_name\ncol\n".to_vec(),
            source_archive: with_archive.then(|| (format!("{name}.zip"), b"zip".to_vec())),
            replacing_file_id: None,
        }
    }

    #[tokio::test]
    async fn test_upload_data_stores_pair_blob_and_import() {
        let fixture = fixture();
        let info = fixture
            .service
            .upload_data(fixture.release_id, upload("absence", true), "author@example.test")
            .await
            .unwrap();

        assert_eq!(info.file.kind, FileKind::Data);
        assert_eq!(info.link.name.as_deref(), Some("absence"));
        assert_eq!(info.link.ord, 0);
        assert!(fixture.blobs.contains(&info.file.blob_path()));
        assert!(fixture.imports.contains(info.file.id));

        let meta_id = info.file.paired_file_id.expect("paired metadata file");
        let meta = fixture.db.get_file(meta_id).unwrap().unwrap();
        assert_eq!(meta.kind, FileKind::Metadata);
        assert_eq!(meta.paired_file_id, Some(info.file.id));
        assert_eq!(meta.source_archive_id, info.file.source_archive_id);
        assert!(fixture.blobs.contains(&meta.blob_path()));

        let archive_id = info.file.source_archive_id.expect("source archive");
        let archive = fixture.db.get_file(archive_id).unwrap().unwrap();
        assert_eq!(archive.kind, FileKind::Archive);
        assert!(fixture.blobs.contains(&archive.blob_path()));
    }

    #[tokio::test]
    async fn test_data_file_orders_assigned_sequentially() {
        let fixture = fixture();
        let first = fixture
            .service
            .upload_data(fixture.release_id, upload("one", false), "author@example.test")
            .await
            .unwrap();
        let second = fixture
            .service
            .upload_data(fixture.release_id, upload("two", false), "author@example.test")
            .await
            .unwrap();

        assert_eq!(first.link.ord, 0);
        assert_eq!(second.link.ord, 1);
    }

    #[tokio::test]
    async fn test_reorder_data_renumbers_only_data_files() {
        let fixture = fixture();
        let one = fixture
            .service
            .upload_data(fixture.release_id, upload("one", false), "author@example.test")
            .await
            .unwrap();
        let two = fixture
            .service
            .upload_data(fixture.release_id, upload("two", false), "author@example.test")
            .await
            .unwrap();
        fixture
            .service
            .upload_ancillary(
                fixture.release_id,
                "Notes",
                "notes.pdf",
                b"pdf",
                "author@example.test",
            )
            .await
            .unwrap();

        let err = fixture
            .service
            .reorder_data(fixture.release_id, vec![one.file.id])
            .await
            .unwrap_err();
        assert_eq!(
            err.validation_codes(),
            vec![ValidationCode::DataFileIdsDifferFromActual]
        );

        let reordered = fixture
            .service
            .reorder_data(fixture.release_id, vec![two.file.id, one.file.id])
            .await
            .unwrap();
        assert_eq!(
            reordered.iter().map(|i| i.file.id).collect::<Vec<_>>(),
            vec![two.file.id, one.file.id]
        );
        assert_eq!(reordered.iter().map(|i| i.link.ord).collect::<Vec<_>>(), vec![0, 1]);

        // Ancillary files keep their fixed order.
        let ancillary = fixture
            .service
            .list(fixture.release_id, Some(FileKind::Ancillary))
            .await
            .unwrap();
        assert_eq!(ancillary[0].link.ord, 0);
    }

    #[tokio::test]
    async fn test_delete_data_removes_pair_and_sole_archive() {
        let fixture = fixture();
        let info = fixture
            .service
            .upload_data(fixture.release_id, upload("absence", true), "author@example.test")
            .await
            .unwrap();
        let meta_id = info.file.paired_file_id.unwrap();
        let archive_id = info.file.source_archive_id.unwrap();

        fixture
            .service
            .delete_data(fixture.release_id, info.file.id)
            .await
            .unwrap();

        assert!(fixture.db.get_file(info.file.id).unwrap().is_none());
        assert!(fixture.db.get_file(meta_id).unwrap().is_none());
        assert!(fixture.db.get_file(archive_id).unwrap().is_none());
        assert!(!fixture.blobs.contains(&format!("data/{}", info.file.id)));
        assert!(!fixture.blobs.contains(&format!("metadata/{meta_id}")));
        assert!(!fixture.blobs.contains(&format!("archive/{archive_id}")));
        assert!(!fixture.imports.contains(info.file.id));
    }

    #[tokio::test]
    async fn test_delete_data_keeps_archive_other_files_depend_on() {
        let fixture = fixture();
        let first = fixture
            .service
            .upload_data(fixture.release_id, upload("one", true), "author@example.test")
            .await
            .unwrap();
        let archive_id = first.file.source_archive_id.unwrap();

        // A second pair extracted from the same archive.
        let second = fixture
            .service
            .upload_data(fixture.release_id, upload("two", false), "author@example.test")
            .await
            .unwrap();
        let second_meta = second.file.paired_file_id.unwrap();
        let conn_update = |file_id: Uuid| {
            let file = fixture.db.get_file(file_id).unwrap().unwrap();
            fixture.db.delete_file_row(file_id).unwrap();
            fixture
                .db
                .insert_file(&FileReference {
                    source_archive_id: Some(archive_id),
                    ..file
                })
                .unwrap();
        };
        // Re-home the second pair onto the shared archive.
        fixture.db.delete_release_file_link(fixture.release_id, second.file.id).unwrap();
        fixture.db.delete_release_file_link(fixture.release_id, second_meta).unwrap();
        conn_update(second.file.id);
        conn_update(second_meta);
        fixture
            .db
            .insert_release_file(&ReleaseFileLink {
                id: Uuid::new_v4(),
                release_id: fixture.release_id,
                file_id: second.file.id,
                name: Some("two".to_string()),
                ord: 1,
            })
            .unwrap();
        fixture
            .db
            .insert_release_file(&ReleaseFileLink {
                id: Uuid::new_v4(),
                release_id: fixture.release_id,
                file_id: second_meta,
                name: None,
                ord: 0,
            })
            .unwrap();

        fixture
            .service
            .delete_data(fixture.release_id, first.file.id)
            .await
            .unwrap();

        // The second pair still depends on the archive, so it survives.
        assert!(fixture.db.get_file(archive_id).unwrap().is_some());

        fixture
            .service
            .delete_data(fixture.release_id, second.file.id)
            .await
            .unwrap();
        assert!(fixture.db.get_file(archive_id).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_inherited_data_file_only_unlinks() {
        let fixture = fixture();
        let info = fixture
            .service
            .upload_data(fixture.release_id, upload("shared", false), "author@example.test")
            .await
            .unwrap();
        let meta_id = info.file.paired_file_id.unwrap();

        // Link the same pair to a second release, as an amendment does.
        let publication = seed_publication(&fixture.db);
        let other_release = seed_release(&fixture.db, &publication);
        for (file_id, ord) in [(info.file.id, 0), (meta_id, 0)] {
            fixture
                .db
                .insert_release_file(&ReleaseFileLink {
                    id: Uuid::new_v4(),
                    release_id: other_release.id,
                    file_id,
                    name: None,
                    ord,
                })
                .unwrap();
        }

        fixture
            .service
            .delete_data(fixture.release_id, info.file.id)
            .await
            .unwrap();

        // Unlinked here, but the shared file, blob and import survive.
        assert!(fixture
            .db
            .get_release_file(fixture.release_id, info.file.id)
            .unwrap()
            .is_none());
        assert!(fixture.db.get_file(info.file.id).unwrap().is_some());
        assert!(fixture.blobs.contains(&info.file.blob_path()));
        assert!(fixture.imports.contains(info.file.id));
    }

    #[tokio::test]
    async fn test_replacement_chain_set_and_completed() {
        let fixture = fixture();
        let original = fixture
            .service
            .upload_data(fixture.release_id, upload("original", false), "author@example.test")
            .await
            .unwrap();

        let replacement = fixture
            .service
            .upload_data(
                fixture.release_id,
                DataFileUpload {
                    replacing_file_id: Some(original.file.id),
                    ..upload("replacement", false)
                },
                "author@example.test",
            )
            .await
            .unwrap();

        let original_file = fixture.db.get_file(original.file.id).unwrap().unwrap();
        assert_eq!(original_file.replaced_by_id, Some(replacement.file.id));
        assert_eq!(replacement.file.replacing_id, Some(original.file.id));

        // Deleting the original completes the replacement.
        fixture
            .service
            .delete_data(fixture.release_id, original.file.id)
            .await
            .unwrap();
        let replacement_file = fixture.db.get_file(replacement.file.id).unwrap().unwrap();
        assert_eq!(replacement_file.replacing_id, None);
    }

    #[tokio::test]
    async fn test_delete_data_aimed_at_ancillary_is_not_found() {
        let fixture = fixture();
        let ancillary = fixture
            .service
            .upload_ancillary(
                fixture.release_id,
                "Notes",
                "notes.pdf",
                b"pdf",
                "author@example.test",
            )
            .await
            .unwrap();

        let err = fixture
            .service
            .delete_data(fixture.release_id, ancillary.file.id)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
