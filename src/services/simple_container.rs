use std::sync::Arc;

use crate::config::Config;
use crate::core::data::{Database, StatsDatabase};
use crate::core::infrastructure::{
    BlobStore, FsBlobStore, HttpNotifier, ImportTracker, NoopNotifier, Notifier,
    SqliteImportTracker,
};
use crate::core::services::{
    AmendmentService, ChecklistService, ContentService, DataBlockService, ImageService,
    KeyStatService, ReleaseApprovalService, ReleaseFileService, ReleaseService,
};
use crate::error::Result;

pub struct SimpleServices {
    config: Arc<Config>,
}

/// Every domain service, fully wired.
pub struct ServiceSet {
    pub imports: Arc<dyn ImportTracker>,
    pub content: ContentService,
    pub releases: ReleaseService,
    pub approval: ReleaseApprovalService,
    pub amendment: AmendmentService,
    pub data_blocks: Arc<DataBlockService>,
    pub key_stats: KeyStatService,
    pub files: ReleaseFileService,
    pub images: ImageService,
}

impl SimpleServices {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> Arc<Config> {
        self.config.clone()
    }

    pub async fn create_database(&self) -> Result<Arc<Database>> {
        Ok(Arc::new(
            Database::new(&self.config.content_database_path).await?,
        ))
    }

    pub async fn create_stats_database(&self) -> Result<Arc<StatsDatabase>> {
        Ok(Arc::new(
            StatsDatabase::new(&self.config.statistics_database_path).await?,
        ))
    }

    pub fn create_blob_store(&self) -> Arc<dyn BlobStore> {
        Arc::new(FsBlobStore::new(self.config.blob_storage_path.clone()))
    }

    pub fn create_notifier(&self) -> Result<Arc<dyn Notifier>> {
        match &self.config.notifier_endpoint {
            Some(endpoint) => Ok(Arc::new(HttpNotifier::new(endpoint)?)),
            None => Ok(Arc::new(NoopNotifier)),
        }
    }

    pub fn create_import_tracker(&self, db: Arc<Database>) -> Arc<dyn ImportTracker> {
        Arc::new(SqliteImportTracker::new(db))
    }

    /// Open both stores and wire every service.
    pub async fn create_services(&self) -> Result<ServiceSet> {
        let db = self.create_database().await?;
        let stats_db = self.create_stats_database().await?;
        let blobs = self.create_blob_store();
        let notifier = self.create_notifier()?;
        let imports = self.create_import_tracker(db.clone());

        let checklist = Arc::new(ChecklistService::new(db.clone(), imports.clone()));
        let data_blocks = Arc::new(DataBlockService::new(db.clone()));

        Ok(ServiceSet {
            content: ContentService::new(db.clone()),
            releases: ReleaseService::new(db.clone(), stats_db.clone()),
            approval: ReleaseApprovalService::new(
                db.clone(),
                checklist,
                notifier.clone(),
                blobs.clone(),
            ),
            amendment: AmendmentService::new(db.clone(), stats_db.clone()),
            key_stats: KeyStatService::new(db.clone(), data_blocks.clone()),
            files: ReleaseFileService::new(db.clone(), blobs.clone(), imports.clone()),
            images: ImageService::new(db, blobs),
            imports,
            data_blocks,
        })
    }
}
